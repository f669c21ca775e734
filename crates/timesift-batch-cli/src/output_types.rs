use serde::Serialize;
use std::collections::BTreeMap;
use timesift_batch_core::models::JobOutcome;
use timesift_batch_core::validation::ValidationIssue;

/// Output for run command
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub run_id: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcomes: Vec<JobOutcome>,
}

/// Output for plan command
#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub program: String,
    pub invocations: Vec<PlannedInvocation>,
}

#[derive(Debug, Serialize)]
pub struct PlannedInvocation {
    pub site: String,
    pub command_line: String,
    pub argv: Vec<String>,
}

/// Output for validate command
#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub jobs_file: String,
    pub job_count: usize,
    pub issues: Vec<ValidationIssue>,
    pub config: BTreeMap<String, ConfigValue>,
}

#[derive(Debug, Serialize)]
pub struct ConfigValue {
    pub value: String,
    pub source: String,
}

/// Output for init command
#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub path: String,
    pub sites: usize,
}
