// ABOUTME: Collects per-job results and renders the end-of-run summary
// ABOUTME: Each result lands in exactly one bucket: succeeded, timed out or failed

use crate::runner::JobOutcome;

pub const SUMMARY_TITLE: &str = "Rclone";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub job_name: String,
    pub successful: bool,
    pub error_message: String,
    pub timed_out: bool,
}

impl JobResult {
    pub fn from_outcome(job_name: &str, outcome: JobOutcome) -> Self {
        Self {
            job_name: job_name.to_string(),
            successful: outcome.successful,
            error_message: outcome.error_message,
            timed_out: outcome.timed_out,
        }
    }

    /// A job that could not be carried out at all.
    pub fn failed(job_name: &str, error_message: String) -> Self {
        Self {
            job_name: job_name.to_string(),
            successful: false,
            error_message,
            timed_out: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Vec<JobResult>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: JobResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[JobResult] {
        &self.results
    }

    /// Buckets results in precedence order: success, then timeout, then failure.
    pub fn summary(&self) -> Summary<'_> {
        let mut summary = Summary::default();
        for result in &self.results {
            if result.successful {
                summary.succeeded.push(result);
            } else if result.timed_out {
                summary.timed_out.push(result);
            } else {
                summary.failed.push(result);
            }
        }
        summary
    }
}

#[derive(Debug, Default)]
pub struct Summary<'a> {
    pub succeeded: Vec<&'a JobResult>,
    pub timed_out: Vec<&'a JobResult>,
    pub failed: Vec<&'a JobResult>,
}

impl Summary<'_> {
    pub fn message(&self) -> String {
        let mut msg = format!("{} jobs completed successfully", self.succeeded.len());
        if !self.timed_out.is_empty() {
            msg.push_str(&format!(", {} timed out", self.timed_out.len()));
        }
        if !self.failed.is_empty() {
            msg.push_str(&format!(", {} failed", self.failed.len()));
        }
        msg.push('!');

        append_list(&mut msg, "Failed jobs:", &self.failed);
        append_list(&mut msg, "Timed out jobs:", &self.timed_out);
        msg
    }
}

fn append_list(msg: &mut String, heading: &str, results: &[&JobResult]) {
    if results.is_empty() {
        return;
    }
    msg.push_str("\n\n");
    msg.push_str(heading);
    for result in results {
        msg.push_str("\n* ");
        msg.push_str(&result.job_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, successful: bool, error: &str, timed_out: bool) -> JobResult {
        JobResult {
            job_name: name.to_string(),
            successful,
            error_message: error.to_string(),
            timed_out,
        }
    }

    #[test]
    fn test_one_of_each() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record(result("photos", true, "", false));
        aggregator.record(result("music", false, "", true));
        aggregator.record(result("docs", false, "permission denied", false));

        assert_eq!(
            aggregator.summary().message(),
            "1 jobs completed successfully, 1 timed out, 1 failed!\n\n\
             Failed jobs:\n* docs\n\n\
             Timed out jobs:\n* music"
        );
    }

    #[test]
    fn test_timed_out_with_error_is_listed_once() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record(result("music", false, "rate limit exceeded", true));

        let summary = aggregator.summary();
        assert_eq!(summary.timed_out.len(), 1);
        assert!(summary.failed.is_empty());
        assert_eq!(summary.message().matches("* music").count(), 1);
    }

    #[test]
    fn test_success_takes_precedence() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record(result("photos", true, "retried 2 times", true));

        let summary = aggregator.summary();
        assert_eq!(summary.succeeded.len(), 1);
        assert_eq!(summary.message(), "1 jobs completed successfully!");
    }

    #[test]
    fn test_failure_without_message_still_counts() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record(JobResult::failed("docs", String::new()));

        assert_eq!(aggregator.summary().failed.len(), 1);
    }

    #[test]
    fn test_from_outcome() {
        let outcome = JobOutcome {
            successful: false,
            error_message: "boom".to_string(),
            timed_out: true,
        };
        assert_eq!(
            JobResult::from_outcome("music", outcome),
            result("music", false, "boom", true)
        );
    }
}
