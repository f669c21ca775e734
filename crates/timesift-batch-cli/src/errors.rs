use console::style;
use std::fmt;
use std::path::Path;
use timesift_batch_core::BatchError;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a job file that cannot be read
pub fn job_file_not_found(path: &Path) -> CliError {
    CliError::new("Job file not found")
        .with_context(format!("The job file could not be read.\n\nPath: {}", path.display()))
        .with_suggestion("Check the file path and try again")
        .with_suggestion(format!("Create a template: timesift-batch init {}", path.display()))
        .with_help("Run: timesift-batch init --help")
}

/// Create error for a job file that does not describe valid sites
pub fn invalid_job_file(reason: &str) -> CliError {
    CliError::new("Invalid job file")
        .with_context(format!("The job file could not be turned into site jobs.\n\nReason: {}", reason))
        .with_suggestion("Every site needs all pipeline parameters, either on the site or in [defaults]")
        .with_suggestion("Check the file: timesift-batch validate <JOBS_FILE>")
        .with_help("Run: timesift-batch init --dry-run")
}

/// Create error for invalid dispatch configuration
pub fn invalid_config(reason: &str) -> CliError {
    CliError::new("Invalid dispatch configuration")
        .with_context(format!("A value in the [dispatch] table is invalid.\n\nReason: {}", reason))
        .with_suggestion("Fix the [dispatch] table of the job file")
        .with_help("Run: timesift-batch validate <JOBS_FILE>")
}

/// Create error for sites that did not finish successfully
pub fn sites_failed(failed: usize, total: usize) -> CliError {
    CliError::new(format!("{} of {} sites did not succeed", failed, total))
        .with_context("See the summary above for how each site ended.")
        .with_suggestion("Rerun with --log-dir logs to keep each site's pipeline output")
        .with_suggestion("Check the printed command lines: timesift-batch plan <JOBS_FILE>")
}

/// Create error for a pipeline program that could not be started
pub fn program_not_found(program: &str) -> CliError {
    CliError::new("Pipeline program could not be started")
        .with_context(format!("Launching '{}' failed for every site.", program))
        .with_suggestion("Put timesift on PATH, or pass --program /path/to/timesift")
        .with_suggestion("Or run through python: --program python --program-arg hsfm/timesift/timesift.py")
        .with_help("Run: timesift-batch run --help")
}

/// Create error for a log directory the pipeline output could not be written to
pub fn log_dir_unavailable(log_dir: &Path, sites: usize) -> CliError {
    CliError::new("Log directory is not writable")
        .with_context(format!(
            "{} site(s) were not launched because their log file could not be created.\n\nLog directory: {}",
            sites,
            log_dir.display()
        ))
        .with_suggestion("Check that the path is a directory you can write to")
        .with_suggestion("Or unset log_dir / --log-dir to let pipeline output reach the terminal")
}

/// Create error for a batch stopped with Ctrl-C
pub fn interrupted() -> CliError {
    CliError::new("Interrupted")
        .with_context("Running pipeline processes were killed; sites that had not started were not launched.")
        .with_suggestion("Rerun the batch; finished sites are run again from scratch")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(batch_error) = error.downcast_ref::<BatchError>() {
        return match batch_error {
            BatchError::JobFileRead { path, .. } => job_file_not_found(path),
            BatchError::JobFileParse { .. }
            | BatchError::MissingField { .. }
            | BatchError::InvalidValue { .. }
            | BatchError::DegenerateBounds { .. } => invalid_job_file(&batch_error.to_string()),
            BatchError::ConfigInvalid { .. } => invalid_config(&batch_error.to_string()),
        };
    }

    let message = format!("{:#}", error);
    if message.contains("Permission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check file permissions")
    } else {
        CliError::new(message)
    }
}
