//! Plan command implementation
//!
//! Human output is one command line per site and nothing else, so it can be
//! redirected into a shell script.

use crate::cli::PlanArgs;
use crate::config_loader::{load_batch, program_args_override};
use crate::output::OutputWriter;
use crate::output_types::{PlanOutput, PlannedInvocation};
use anyhow::Result;
use timesift_batch_core::config::CliConfigOverrides;
use timesift_batch_core::models::Invocation;

pub fn execute(args: PlanArgs, output: &OutputWriter) -> Result<()> {
    let overrides = CliConfigOverrides {
        program: args.program,
        program_args: program_args_override(args.program_args),
        ..Default::default()
    };
    let loaded = load_batch(&args.jobs_file, overrides)?;
    let program = loaded.config.program();

    let invocations: Vec<Invocation> = loaded
        .job_file
        .jobs
        .iter()
        .enumerate()
        .map(|(index, job)| Invocation::build(index, &program, job))
        .collect();

    if output.is_json() {
        let plan = PlanOutput {
            program: program.command.clone(),
            invocations: invocations
                .iter()
                .map(|invocation| PlannedInvocation {
                    site: invocation.site.clone(),
                    command_line: invocation.command_line(),
                    argv: invocation.argv(),
                })
                .collect(),
        };
        output.result(plan)?;
    } else {
        for invocation in &invocations {
            output.plain(invocation.command_line());
        }
    }

    Ok(())
}
