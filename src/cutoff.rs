// ABOUTME: Daily wall-clock cutoff used to bound how long a sync job may run
// ABOUTME: Converts "time left until HH:00 today" into a per-job timeout

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use clap::ValueEnum;
use std::time::Duration;

use crate::error::{Result, SyncError};

/// What to do when a job is about to start and today's cutoff already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PastCutoffPolicy {
    /// Bound the job by tomorrow's cutoff instead.
    #[default]
    NextDay,
    /// Zero timeout: the job is cancelled at its first status check.
    Expire,
}

#[derive(Debug, Clone, Copy)]
pub struct CutoffScheduler {
    cutoff: NaiveTime,
    policy: PastCutoffPolicy,
}

impl CutoffScheduler {
    pub fn new(cutoff_hour: u32, policy: PastCutoffPolicy) -> Result<Self> {
        let cutoff = NaiveTime::from_hms_opt(cutoff_hour, 0, 0).ok_or_else(|| {
            SyncError::Config(format!(
                "cutoff hour must be between 0 and 23, got {}",
                cutoff_hour
            ))
        })?;
        Ok(Self { cutoff, policy })
    }

    /// Signed time left until today's cutoff. Negative once the cutoff passed;
    /// this never rolls over to the next day.
    pub fn time_until_cutoff(&self, now: NaiveDateTime) -> TimeDelta {
        now.date().and_time(self.cutoff) - now
    }

    /// Timeout for a job starting at `now`, truncated to whole seconds.
    pub fn job_timeout(&self, now: NaiveDateTime) -> Duration {
        let remaining = self.time_until_cutoff(now);
        let remaining = match self.policy {
            PastCutoffPolicy::Expire => remaining,
            PastCutoffPolicy::NextDay if remaining < TimeDelta::zero() => {
                remaining + TimeDelta::days(1)
            }
            PastCutoffPolicy::NextDay => remaining,
        };
        Duration::from_secs(remaining.num_seconds().max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 14)
            .unwrap()
            .and_hms_opt(hour, min, sec)
            .unwrap()
    }

    #[test]
    fn test_one_hour_before_cutoff() {
        let scheduler = CutoffScheduler::new(9, PastCutoffPolicy::Expire).unwrap();
        assert_eq!(scheduler.time_until_cutoff(at(8, 0, 0)).num_seconds(), 3600);
    }

    #[test]
    fn test_past_cutoff_is_negative() {
        let scheduler = CutoffScheduler::new(9, PastCutoffPolicy::Expire).unwrap();
        assert_eq!(scheduler.time_until_cutoff(at(10, 0, 0)).num_seconds(), -3600);
    }

    #[test]
    fn test_expire_policy_gives_zero_timeout_past_cutoff() {
        let scheduler = CutoffScheduler::new(9, PastCutoffPolicy::Expire).unwrap();
        assert_eq!(scheduler.job_timeout(at(10, 0, 0)), Duration::ZERO);
        assert_eq!(scheduler.job_timeout(at(1, 30, 0)), Duration::from_secs(27_000));
    }

    #[test]
    fn test_next_day_policy_rolls_over() {
        let scheduler = CutoffScheduler::new(9, PastCutoffPolicy::NextDay).unwrap();
        assert_eq!(
            scheduler.job_timeout(at(10, 0, 0)),
            Duration::from_secs(23 * 3600)
        );
        assert_eq!(scheduler.job_timeout(at(8, 0, 0)), Duration::from_secs(3600));
    }

    #[test]
    fn test_timeout_truncates_to_whole_seconds() {
        let scheduler = CutoffScheduler::new(9, PastCutoffPolicy::Expire).unwrap();
        let now = at(8, 59, 58) + TimeDelta::milliseconds(500);
        assert_eq!(scheduler.job_timeout(now), Duration::from_secs(1));
    }

    #[test]
    fn test_default_policy_rolls_to_next_day() {
        let scheduler = CutoffScheduler::new(9, PastCutoffPolicy::default()).unwrap();
        assert_eq!(scheduler.job_timeout(at(10, 0, 0)), Duration::from_secs(82_800));
    }

    #[test]
    fn test_rejects_invalid_hour() {
        assert!(CutoffScheduler::new(24, PastCutoffPolicy::Expire).is_err());
    }
}
