//! In-memory launcher that records invocations instead of spawning processes.

use crate::launcher::Launcher;
use crate::models::{Invocation, JobStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Stand-in for the external pipeline.
///
/// Every launch is recorded in start order. Sites listed with
/// [`RecordingLauncher::with_exit_code`] report that exit code, every other
/// site succeeds. Clones share the same recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    calls: Arc<Mutex<Vec<Invocation>>>,
    exit_codes: Arc<Mutex<HashMap<String, i32>>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make launches for `site` exit with `code`
    pub fn with_exit_code(self, site: impl Into<String>, code: i32) -> Self {
        self.exit_codes.lock().unwrap().insert(site.into(), code);
        self
    }

    /// Hold every launch open for `delay` before it completes
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Invocations recorded so far, in start order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of launches that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Launcher for RecordingLauncher {
    async fn launch(&self, invocation: &Invocation) -> JobStatus {
        self.calls.lock().unwrap().push(invocation.clone());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let code = self.exit_codes.lock().unwrap().get(&invocation.site).copied();
        match code {
            None | Some(0) => JobStatus::Succeeded,
            Some(code) => JobStatus::Failed {
                exit_code: Some(code),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::fixtures::site_job;
    use crate::models::Program;

    #[tokio::test]
    async fn test_records_and_scripts_exit_codes() {
        let launcher = RecordingLauncher::new().with_exit_code("bad", 2);
        let program = Program::default();

        let ok = launcher.launch(&Invocation::build(0, &program, &site_job("good"))).await;
        let bad = launcher.launch(&Invocation::build(1, &program, &site_job("bad"))).await;

        assert_eq!(ok, JobStatus::Succeeded);
        assert_eq!(bad, JobStatus::Failed { exit_code: Some(2) });
        assert_eq!(launcher.call_count(), 2);
        assert_eq!(launcher.invocations()[1].site, "bad");
        assert_eq!(launcher.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_recording() {
        let launcher = RecordingLauncher::new();
        let clone = launcher.clone();
        clone
            .launch(&Invocation::build(0, &Program::default(), &site_job("a")))
            .await;

        assert_eq!(launcher.call_count(), 1);
        launcher.clear();
        assert_eq!(clone.call_count(), 0);
    }
}
