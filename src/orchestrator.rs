// ABOUTME: Drives a whole run: every configured job in order, then the optional mirror pass
// ABOUTME: Job failures become results; only an unrestartable container aborts the run

use chrono::{Local, NaiveDateTime};
use tracing::{error, info, warn};

use crate::config::JobsConfig;
use crate::containers::ContainerRuntime;
use crate::cutoff::CutoffScheduler;
use crate::error::{Result, SyncError};
use crate::notify::{deliver, Notifier};
use crate::remote::RemoteControl;
use crate::report::{JobResult, ResultAggregator, SUMMARY_TITLE};
use crate::runner::{JobRunner, SyncPlan};

#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    /// Skip the rest of the job list once a job hits its timeout.
    pub abort_on_timeout: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            abort_on_timeout: true,
        }
    }
}

type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

enum Step {
    Continue,
    TimedOut,
    Fatal(SyncError),
}

pub struct Orchestrator<C, R> {
    runner: JobRunner<C, R>,
    scheduler: CutoffScheduler,
    settings: RunSettings,
    clock: Clock,
}

impl<C: RemoteControl, R: ContainerRuntime> Orchestrator<C, R> {
    pub fn new(runner: JobRunner<C, R>, scheduler: CutoffScheduler, settings: RunSettings) -> Self {
        Self {
            runner,
            scheduler,
            settings,
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Runs all jobs, then sends one summary. A fatal error is returned only
    /// after the summary has gone out.
    pub async fn run(
        &mut self,
        config: &JobsConfig,
        notifier: &dyn Notifier,
    ) -> Result<ResultAggregator> {
        let mut results = ResultAggregator::new();
        let fatal = self.run_all(config, &mut results).await;

        let message = results.summary().message();
        info!("{}", message);
        deliver(notifier, SUMMARY_TITLE, &message).await;

        match fatal {
            Some(e) => Err(e),
            None => {
                info!("DONE");
                Ok(results)
            }
        }
    }

    async fn run_all(
        &mut self,
        config: &JobsConfig,
        results: &mut ResultAggregator,
    ) -> Option<SyncError> {
        for (index, job) in config.jobs.iter().enumerate() {
            let now = (self.clock)();
            let timeout = job
                .timeout
                .unwrap_or_else(|| self.scheduler.job_timeout(now));
            let plan = SyncPlan::for_job(job, Some(timeout), now.date());

            match self.execute(&plan, results).await {
                Step::Continue => {}
                Step::TimedOut if self.settings.abort_on_timeout => {
                    let skipped = config.jobs.len() - index - 1;
                    if skipped > 0 {
                        warn!(
                            "Job {} timed out, skipping the remaining {} job(s)",
                            job.name, skipped
                        );
                    }
                    break;
                }
                Step::TimedOut => {}
                Step::Fatal(e) => return Some(e),
            }
        }

        if let Some(mirror) = &config.mirror {
            if let Step::Fatal(e) = self.execute(&SyncPlan::for_mirror(mirror), results).await {
                return Some(e);
            }
        }

        None
    }

    async fn execute(&mut self, plan: &SyncPlan, results: &mut ResultAggregator) -> Step {
        match self.runner.run(plan).await {
            Ok(outcome) => {
                let timed_out = outcome.timed_out;
                results.record(JobResult::from_outcome(&plan.name, outcome));
                if timed_out {
                    Step::TimedOut
                } else {
                    Step::Continue
                }
            }
            Err(e) if e.is_fatal() => {
                error!("Aborting run after {}: {}", plan.name, e);
                results.record(JobResult::failed(&plan.name, e.to_string()));
                Step::Fatal(e)
            }
            Err(e) => {
                results.record(JobResult::failed(&plan.name, e.to_string()));
                Step::Continue
            }
        }
    }
}
