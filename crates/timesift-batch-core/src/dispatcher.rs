//! Batch Job Dispatcher
//!
//! Launches one pipeline invocation per site job. With a concurrency of 1
//! (the default) jobs run strictly one after another; with a higher value at
//! most that many run at once. Outcomes are always reported in job order and
//! a failed job never stops the batch unless fail-fast is enabled.

use crate::launcher::Launcher;
use crate::models::{BatchReport, Invocation, JobOutcome, JobStatus, Program, SiteJob};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How the dispatcher schedules jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Maximum number of pipeline processes running at once
    pub concurrency: usize,
    /// Stop launching new jobs after the first unsuccessful one
    pub fail_fast: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            fail_fast: false,
        }
    }
}

/// Hooks for following a dispatch as it happens
pub trait DispatchObserver: Send + Sync {
    fn job_started(&self, _index: usize, _invocation: &Invocation) {}

    fn job_finished(&self, _outcome: &JobOutcome) {}
}

struct NoopObserver;

impl DispatchObserver for NoopObserver {}

pub struct Dispatcher<L: Launcher> {
    launcher: L,
    program: Program,
    options: DispatchOptions,
}

impl<L: Launcher> Dispatcher<L> {
    pub fn new(launcher: L, program: Program) -> Self {
        Self {
            launcher,
            program,
            options: DispatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = DispatchOptions {
            concurrency: options.concurrency.max(1),
            ..options
        };
        self
    }

    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    /// Invocations that `run_all` would launch, without launching anything
    pub fn plan(&self, jobs: &[SiteJob]) -> Vec<Invocation> {
        jobs.iter()
            .enumerate()
            .map(|(index, job)| Invocation::build(index, &self.program, job))
            .collect()
    }

    /// Dispatch every job and collect the outcomes in job order
    pub async fn run_all(&self, jobs: &[SiteJob]) -> BatchReport {
        self.run_all_observed(jobs, &NoopObserver).await
    }

    pub async fn run_all_observed(
        &self,
        jobs: &[SiteJob],
        observer: &dyn DispatchObserver,
    ) -> BatchReport {
        let halted = AtomicBool::new(false);
        let halted = &halted;
        let total = jobs.len();

        tracing::info!(
            "Dispatching {} jobs (concurrency {}, fail-fast {})",
            total,
            self.options.concurrency,
            self.options.fail_fast
        );

        let outcomes = if self.options.concurrency == 1 {
            let mut outcomes = Vec::with_capacity(total);
            for (index, job) in jobs.iter().enumerate() {
                outcomes.push(self.dispatch_one(index, total, job, halted, observer).await);
            }
            outcomes
        } else {
            // `buffered` keeps at most `concurrency` launches in flight and
            // yields them in input order.
            stream::iter(jobs.iter().enumerate())
                .map(move |(index, job)| self.dispatch_one(index, total, job, halted, observer))
                .buffered(self.options.concurrency)
                .collect::<Vec<_>>()
                .await
        };

        let report = BatchReport::new(outcomes);
        tracing::info!(
            run_id = %report.run_id,
            "Batch finished: {} succeeded, {} failed, {} skipped",
            report.success_count(),
            report.failure_count(),
            report.skipped_count()
        );
        report
    }

    async fn dispatch_one(
        &self,
        index: usize,
        total: usize,
        job: &SiteJob,
        halted: &AtomicBool,
        observer: &dyn DispatchObserver,
    ) -> JobOutcome {
        if halted.load(Ordering::SeqCst) {
            tracing::info!(site = %job.name, "Skipping job {}/{} after earlier failure", index + 1, total);
            let outcome = JobOutcome {
                index,
                site: job.name.clone(),
                output_path: job.output_path.clone(),
                status: JobStatus::Skipped,
                started_at: None,
                duration: Duration::ZERO,
            };
            observer.job_finished(&outcome);
            return outcome;
        }

        let invocation = Invocation::build(index, &self.program, job);
        tracing::info!(site = %job.name, "Launching job {}/{}", index + 1, total);
        tracing::debug!(site = %job.name, command = %invocation.command_line());
        observer.job_started(index, &invocation);

        let started_at = Utc::now();
        let start = Instant::now();
        let status = self.launcher.launch(&invocation).await;
        let duration = start.elapsed();

        if status.is_success() {
            tracing::info!(site = %job.name, "Job finished in {:.1}s", duration.as_secs_f64());
        } else {
            tracing::warn!(site = %job.name, "Job {}", status.label());
            if self.options.fail_fast {
                halted.store(true, Ordering::SeqCst);
            }
        }

        let outcome = JobOutcome {
            index,
            site: job.name.clone(),
            output_path: job.output_path.clone(),
            status,
            started_at: Some(started_at),
            duration,
        };
        observer.job_finished(&outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::RecordingLauncher;
    use crate::models::job::fixtures::site_job;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl DispatchObserver for EventLog {
        fn job_started(&self, index: usize, invocation: &Invocation) {
            self.0.lock().unwrap().push(format!("start {} {}", index, invocation.site));
        }

        fn job_finished(&self, outcome: &JobOutcome) {
            self.0
                .lock()
                .unwrap()
                .push(format!("finish {} {}", outcome.index, outcome.status.label()));
        }
    }

    #[tokio::test]
    async fn test_observer_sees_sequential_events() {
        let dispatcher = Dispatcher::new(RecordingLauncher::new(), Program::default());
        let log = EventLog::default();
        let jobs = vec![site_job("a"), site_job("b")];

        dispatcher.run_all_observed(&jobs, &log).await;

        assert_eq!(
            *log.0.lock().unwrap(),
            vec!["start 0 a", "finish 0 succeeded", "start 1 b", "finish 1 succeeded"]
        );
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let dispatcher = Dispatcher::new(RecordingLauncher::new(), Program::default())
            .with_options(DispatchOptions {
                concurrency: 0,
                fail_fast: false,
            });
        assert_eq!(dispatcher.options().concurrency, 1);
    }

    #[test]
    fn test_plan_does_not_launch() {
        let launcher = RecordingLauncher::new();
        let dispatcher = Dispatcher::new(launcher.clone(), Program::default());

        let plan = dispatcher.plan(&[site_job("a"), site_job("b")]);

        assert_eq!(plan.len(), 2);
        assert_eq!(launcher.call_count(), 0);
    }
}
