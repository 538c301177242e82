// ABOUTME: Command-line entry point for the rclone backup runner
// ABOUTME: Wires the rc client, Docker and the notifier into the run driver

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use rclone_sync::containers::DockerRuntime;
use rclone_sync::cutoff::{CutoffScheduler, PastCutoffPolicy};
use rclone_sync::logging::{self, LogSettings, DEFAULT_MAX_LOG_BYTES};
use rclone_sync::notify::{LogNotifier, Notifier, PushoverNotifier};
use rclone_sync::remote::{RcClient, RcCredentials};
use rclone_sync::runner::DEFAULT_POLL_INTERVAL;
use rclone_sync::{JobRunner, JobsConfig, Orchestrator, RunSettings};

#[derive(Parser)]
#[command(name = "rclone-sync")]
#[command(version, about = "Run rclone sync jobs with Docker workloads paused, bounded by a daily cutoff")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// YAML file listing the jobs to run
    #[arg(short, long, global = true, env = "RCLONE_SYNC_JOBS", default_value = "jobs.yml")]
    config: PathBuf,

    /// Base URL of the rclone remote control server
    #[arg(long, global = true, env = "RCLONE_RC_URL", default_value = "http://localhost:5572")]
    rc_url: String,

    #[arg(long, global = true, env = "RCLONE_RC_USER")]
    rc_user: Option<String>,

    #[arg(long, global = true, env = "RCLONE_RC_PASS", hide_env_values = true)]
    rc_pass: Option<String>,

    /// Hour of day (local time) by which jobs must be finished
    #[arg(long, global = true, default_value_t = 9, value_parser = clap::value_parser!(u32).range(0..=23))]
    cutoff_hour: u32,

    /// What to do with a job that starts after the cutoff
    #[arg(long, global = true, value_enum, default_value_t = PastCutoffPolicy::NextDay)]
    past_cutoff: PastCutoffPolicy,

    /// Keep running the remaining jobs after one times out
    #[arg(long, global = true)]
    continue_after_timeout: bool,

    /// Seconds between job status checks
    #[arg(long, global = true, default_value_t = DEFAULT_POLL_INTERVAL.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,

    #[arg(long, global = true, default_value = "rclone_sync.log")]
    log_file: PathBuf,

    /// Log file size at which it starts over
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_LOG_BYTES)]
    log_max_bytes: u64,

    /// Log to the console only
    #[arg(long, global = true)]
    no_log_file: bool,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every job, then send the summary (default)
    Run,
    /// Check the job file and show the timeout each job would get right now
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(&LogSettings {
        file: (!cli.no_log_file).then(|| cli.log_file.clone()),
        max_bytes: cli.log_max_bytes,
        verbose: cli.verbose,
    })?;

    let config = JobsConfig::load(&cli.config)?;
    let scheduler = CutoffScheduler::new(cli.cutoff_hour, cli.past_cutoff)?;

    match cli.command {
        Some(Commands::Validate) => validate(&config, &scheduler),
        Some(Commands::Run) | None => run(&cli, &config, scheduler).await,
    }
}

async fn run(cli: &Cli, config: &JobsConfig, scheduler: CutoffScheduler) -> Result<()> {
    let credentials = cli.rc_user.as_ref().map(|user| RcCredentials {
        user: user.clone(),
        password: cli.rc_pass.clone().unwrap_or_default(),
    });
    let control = RcClient::new(cli.rc_url.clone(), credentials)?;
    let runtime = DockerRuntime::connect().context("Docker is required to pause containers")?;
    let runner = JobRunner::new(control, runtime, Duration::from_secs(cli.poll_interval));

    let notifier: Box<dyn Notifier> = match &config.pushover {
        Some(pushover) => Box::new(PushoverNotifier::new(pushover)?),
        None => Box::new(LogNotifier),
    };

    let settings = RunSettings {
        abort_on_timeout: !cli.continue_after_timeout,
    };
    info!(
        "Running {} job(s) against {}, cutoff {:02}:00",
        config.jobs.len(),
        cli.rc_url,
        cli.cutoff_hour
    );

    Orchestrator::new(runner, scheduler, settings)
        .run(config, notifier.as_ref())
        .await?;
    Ok(())
}

fn validate(config: &JobsConfig, scheduler: &CutoffScheduler) -> Result<()> {
    let now = Local::now().naive_local();
    let cutoff_timeout = scheduler.job_timeout(now);

    for job in &config.jobs {
        let timeout = job.timeout.unwrap_or(cutoff_timeout);
        println!(
            "{}: {} -> {} (transfers: {}, timeout: {}s)",
            job.name,
            job.source_path,
            job.destination_fs(),
            job.transfers,
            timeout.as_secs()
        );
        if !job.containers_to_stop.is_empty() {
            println!("  pauses: {}", job.containers_to_stop.join(", "));
        }
    }

    if let Some(mirror) = &config.mirror {
        println!(
            "mirror: {}: -> {}: (transfers: {})",
            mirror.source_remote, mirror.destination_remote, mirror.transfers
        );
    }
    println!(
        "notifications: {}",
        if config.pushover.is_some() { "pushover" } else { "log only" }
    );
    Ok(())
}
