//! Command implementations

mod init;
mod plan;
mod run;
mod validate;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    match cli.command {
        Commands::Run(args) => run::execute(args, &output, cli.dry_run).await,
        Commands::Plan(args) => plan::execute(args, &output),
        Commands::Validate(args) => validate::execute(args, &output),
        Commands::Init(args) => init::execute(args, &output, cli.dry_run),
    }
}
