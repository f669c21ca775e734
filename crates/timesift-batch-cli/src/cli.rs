use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// timesift-batch - Run the timesift pipeline over a list of sites
#[derive(Parser, Debug)]
#[command(name = "timesift-batch")]
#[command(about = "Run the timesift pipeline once per site in a job file", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show planned actions without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the pipeline for every site in the job file
    Run(RunArgs),

    /// Print the pipeline command line for every site
    Plan(PlanArgs),

    /// Load the job file and report anything worth a second look
    Validate(ValidateArgs),

    /// Write a template job file
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the job file (TOML, or JSON with a .json extension)
    pub jobs_file: PathBuf,

    /// Maximum number of pipeline processes running at once
    #[arg(long, short = 'j', value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// Stop launching new sites after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Pipeline program to run (defaults to "timesift")
    #[arg(long)]
    pub program: Option<String>,

    /// Argument placed before the pipeline flags; repeat for several
    /// Example: --program python --program-arg hsfm/timesift/timesift.py
    #[arg(long = "program-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub program_args: Vec<String>,

    /// Kill a site's pipeline after this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Write each site's output to <DIR>/<NN>-<site>.log instead of the terminal
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Path to the job file
    pub jobs_file: PathBuf,

    /// Pipeline program to run (defaults to "timesift")
    #[arg(long)]
    pub program: Option<String>,

    /// Argument placed before the pipeline flags; repeat for several
    #[arg(long = "program-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub program_args: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the job file
    pub jobs_file: PathBuf,

    /// Also report input paths that do not exist
    #[arg(long)]
    pub check_paths: bool,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the job file
    #[arg(default_value = "timesift-jobs.toml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

fn parse_concurrency(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("'{}' is not a positive integer", s)),
    }
}
