use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// How a single launch ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Succeeded,
    /// Non-zero exit; `exit_code` is `None` when the process was killed by a signal
    Failed { exit_code: Option<i32> },
    TimedOut { after_secs: u64 },
    SpawnFailed { reason: String },
    /// Not launched because the per-site log file could not be opened
    LogFailed { reason: String },
    /// Not launched because an earlier job failed with fail-fast enabled
    Skipped,
}

impl JobStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }

    pub fn label(&self) -> String {
        match self {
            JobStatus::Succeeded => "succeeded".to_string(),
            JobStatus::Failed { exit_code: Some(code) } => format!("failed (exit {})", code),
            JobStatus::Failed { exit_code: None } => "failed (signal)".to_string(),
            JobStatus::TimedOut { after_secs } => format!("timed out after {}s", after_secs),
            JobStatus::SpawnFailed { reason } => format!("spawn failed: {}", reason),
            JobStatus::LogFailed { reason } => format!("log file unavailable: {}", reason),
            JobStatus::Skipped => "skipped".to_string(),
        }
    }
}

/// Result of dispatching one site job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Position of the job in the job list
    pub index: usize,
    pub site: String,
    pub output_path: PathBuf,
    #[serde(flatten)]
    pub status: JobStatus,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

/// Outcomes of one dispatcher run, in job order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn new(outcomes: Vec<JobOutcome>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            outcomes,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.status.is_success() && o.status != JobStatus::Skipped)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == JobStatus::Skipped)
            .count()
    }

    /// True for an empty batch as well
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, status: JobStatus) -> JobOutcome {
        JobOutcome {
            index,
            site: format!("site-{}", index + 1),
            output_path: PathBuf::from(format!("output/{}", index)),
            status,
            started_at: None,
            duration: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_empty_report() {
        let report = BatchReport::new(Vec::new());
        assert_eq!(report.total(), 0);
        assert_eq!(report.success_count(), 0);
        assert_eq!(report.failure_count(), 0);
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_report_counts() {
        let report = BatchReport::new(vec![
            outcome(0, JobStatus::Succeeded),
            outcome(1, JobStatus::Failed { exit_code: Some(2) }),
            outcome(2, JobStatus::Skipped),
        ]);

        assert_eq!(report.total(), 3);
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.failures().count(), 2);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(JobStatus::Failed { exit_code: Some(3) }.label(), "failed (exit 3)");
        assert_eq!(JobStatus::Failed { exit_code: None }.label(), "failed (signal)");
        assert_eq!(JobStatus::TimedOut { after_secs: 60 }.label(), "timed out after 60s");
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(outcome(1, JobStatus::Failed { exit_code: Some(1) })).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["exit_code"], 1);
        assert_eq!(json["duration"], 1.5);
        assert_eq!(json["site"], "site-2");
    }
}
