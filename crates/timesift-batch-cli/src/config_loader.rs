//! Configuration loading utilities for CLI commands

use anyhow::Result;
use std::path::Path;
use timesift_batch_core::config::{CliConfigOverrides, LayeredConfig};
use timesift_batch_core::jobfile::{load_job_file, JobFile};

/// A job file together with its effective dispatch configuration
pub struct LoadedBatch {
    pub job_file: JobFile,
    pub config: LayeredConfig,
}

/// Load the job file and layer its `[dispatch]` table, the environment and CLI overrides
pub fn load_batch(jobs_file: &Path, overrides: CliConfigOverrides) -> Result<LoadedBatch> {
    let job_file = load_job_file(jobs_file)?;

    let mut config = LayeredConfig::with_defaults()
        .apply_file(&job_file.dispatch)?
        .load_from_env();
    config.update_from_cli(overrides);

    for (key, (value, source)) in config.to_inspection_map() {
        tracing::debug!("dispatch.{} = {} ({:?})", key, value, source);
    }

    Ok(LoadedBatch { job_file, config })
}

/// Turn repeated `--program-arg` values into an override; none given means no override
pub fn program_args_override(args: Vec<String>) -> Option<Vec<String>> {
    if args.is_empty() {
        None
    } else {
        Some(args)
    }
}
