// ABOUTME: Logging setup: console output plus a size-bounded log file
// ABOUTME: The file starts over once it would exceed its size limit

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_MAX_LOG_BYTES: u64 = 1_000_000;

const TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub file: Option<PathBuf>,
    pub max_bytes: u64,
    pub verbose: bool,
}

/// Append-only log file that truncates itself instead of growing past
/// `max_bytes`. No backups are kept.
pub struct SizeBoundedFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
}

impl SizeBoundedFile {
    pub fn open(path: &Path, max_bytes: u64) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            file,
            written,
            max_bytes,
        })
    }

    fn start_over(&mut self) -> io::Result<()> {
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for SizeBoundedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.start_over()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `verbose`.
/// Keep the returned guard alive until exit or buffered file lines are lost.
pub fn init(settings: &LogSettings) -> Result<Option<WorkerGuard>> {
    let default_filter = if settings.verbose {
        "rclone_sync=debug,info"
    } else {
        "info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()));

    let (file_layer, guard) = match &settings.file {
        Some(path) => {
            let file = SizeBoundedFile::open(path, settings.max_bytes)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false)
                .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(guard)
}
