//! Run command implementation

use crate::batch::display_report;
use crate::cli::RunArgs;
use crate::config_loader::{load_batch, program_args_override, LoadedBatch};
use crate::dry_run::{display_planned_actions, ActionType, PlannedAction};
use crate::errors;
use crate::output::OutputWriter;
use crate::progress::BatchProgress;
use anyhow::Result;
use timesift_batch_core::config::CliConfigOverrides;
use timesift_batch_core::launcher::ProcessLauncher;
use timesift_batch_core::models::{BatchReport, JobStatus};
use timesift_batch_core::validation::{validate_jobs, ValidationOptions};
use timesift_batch_core::Dispatcher;

pub async fn execute(args: RunArgs, output: &OutputWriter, dry_run: bool) -> Result<()> {
    let overrides = CliConfigOverrides {
        program: args.program,
        program_args: program_args_override(args.program_args),
        concurrency: args.concurrency,
        fail_fast: args.fail_fast.then_some(true),
        timeout_secs: args.timeout,
        log_dir: args.log_dir,
    };
    let LoadedBatch { job_file, config } = load_batch(&args.jobs_file, overrides)?;
    let jobs = &job_file.jobs;

    // Advisory only; jobs are dispatched exactly as written
    for issue in validate_jobs(jobs, ValidationOptions::default()) {
        output.warning(format!("{}: {}", issue.site, issue.message));
    }

    let program = config.program();
    // In JSON mode stdout belongs to the report
    let launcher = ProcessLauncher::new()
        .with_timeout(config.timeout())
        .with_log_dir(config.log_dir.value.clone())
        .with_stdout_to_stderr(output.is_json());
    let dispatcher = Dispatcher::new(launcher, program.clone()).with_options(config.dispatch_options());

    if dry_run {
        let mut actions = Vec::new();
        if let Some(log_dir) = &config.log_dir.value {
            actions.push(PlannedAction::new(
                ActionType::CreateDirectory,
                format!("Create log directory {}", log_dir.display()),
            ));
        }
        for (job, invocation) in jobs.iter().zip(dispatcher.plan(jobs)) {
            actions.push(
                PlannedAction::new(
                    ActionType::LaunchProcess,
                    format!("Run {} for site '{}'", program.command, job.name),
                )
                .with_detail(format!("Output: {}", job.output_path.display()))
                .with_detail(format!("Command: {}", invocation.command_line())),
            );
        }
        return display_planned_actions(output, &actions);
    }

    if jobs.is_empty() {
        output.info(format!("{} lists no sites; nothing to run", job_file.path.display()));
    } else {
        let options = dispatcher.options();
        output.info(format!(
            "Dispatching {} sites from {} ({} at a time)",
            jobs.len(),
            job_file.path.display(),
            options.concurrency
        ));
    }

    let progress = if output.is_json() || jobs.is_empty() {
        BatchProgress::hidden()
    } else {
        BatchProgress::new(jobs.len())
    };
    // Dropping the dispatch on Ctrl-C kills every running pipeline process
    let report = tokio::select! {
        report = dispatcher.run_all_observed(jobs, &progress) => report,
        _ = tokio::signal::ctrl_c() => {
            progress.abandon();
            return Err(errors::interrupted().into());
        }
    };
    progress.finish(report.success_count(), report.total());

    display_report(output, &report)?;

    if report.all_succeeded() {
        if report.total() > 0 {
            output.success(format!("All {} sites succeeded", report.total()));
        }
        return Ok(());
    }

    if let Some(log_dir) = &config.log_dir.value {
        let log_failures = count_status(&report, |s| matches!(s, JobStatus::LogFailed { .. }));
        if log_failures > 0 {
            return Err(errors::log_dir_unavailable(log_dir, log_failures).into());
        }
    }

    let spawn_failures = count_status(&report, |s| matches!(s, JobStatus::SpawnFailed { .. }));
    let skipped = count_status(&report, |s| matches!(s, JobStatus::Skipped));
    if spawn_failures > 0 && spawn_failures + skipped == report.total() {
        return Err(errors::program_not_found(&program.command).into());
    }

    Err(errors::sites_failed(report.total() - report.success_count(), report.total()).into())
}

fn count_status(report: &BatchReport, predicate: impl Fn(&JobStatus) -> bool) -> usize {
    report.outcomes.iter().filter(|o| predicate(&o.status)).count()
}
