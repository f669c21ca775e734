//! Command line construction for the timesift pipeline.

use crate::models::SiteJob;
use serde::{Deserialize, Serialize};
use shell_escape::escape;
use std::borrow::Cow;
use std::path::Path;

pub const FLAG_OUTPUT_PATH: &str = "--output-path";
pub const FLAG_TEMPLATES_DIR: &str = "--templates-dir";
pub const FLAG_BOUNDS: &str = "--bounds";
pub const FLAG_METADATA_CSV: &str = "--nagap-metadata-csv";
pub const FLAG_DENSECLOUD_QUALITY: &str = "--densecloud-quality";
pub const FLAG_IMAGE_MATCHING_ACCURACY: &str = "--image-matching-accuracy";
pub const FLAG_OUTPUT_RESOLUTION: &str = "--output-resolution";
pub const FLAG_PIXEL_PITCH: &str = "--pixel-pitch";
pub const FLAG_PARALLELIZATION: &str = "--parallelization";
pub const FLAG_REFERENCE_DEM_4D: &str = "--reference-dem-4d";
pub const FLAG_REFERENCE_DEM: &str = "--reference-dem";
pub const FLAG_LICENSE_PATH: &str = "--license-path";

/// Every flag the pipeline receives, in the order they are emitted
pub const PIPELINE_FLAGS: [&str; 12] = [
    FLAG_OUTPUT_PATH,
    FLAG_TEMPLATES_DIR,
    FLAG_BOUNDS,
    FLAG_METADATA_CSV,
    FLAG_DENSECLOUD_QUALITY,
    FLAG_IMAGE_MATCHING_ACCURACY,
    FLAG_OUTPUT_RESOLUTION,
    FLAG_PIXEL_PITCH,
    FLAG_PARALLELIZATION,
    FLAG_REFERENCE_DEM_4D,
    FLAG_REFERENCE_DEM,
    FLAG_LICENSE_PATH,
];

/// Program used to start the pipeline.
///
/// `args` are placed before the pipeline flags, which lets the pipeline be
/// started through an interpreter (`python hsfm/timesift/timesift.py`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub command: String,
    pub args: Vec<String>,
}

impl Program {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new("timesift")
    }
}

/// One flag and the values that follow it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineFlag {
    pub flag: String,
    pub values: Vec<String>,
}

impl PipelineFlag {
    fn single(flag: &str, value: impl ToString) -> Self {
        Self {
            flag: flag.to_string(),
            values: vec![value.to_string()],
        }
    }

    fn path(flag: &str, path: &Path) -> Self {
        Self::single(flag, path.to_string_lossy())
    }
}

/// A fully assembled pipeline invocation for one site job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Position of the job in the job list
    pub index: usize,
    pub site: String,
    pub program: Program,
    pub flags: Vec<PipelineFlag>,
}

impl Invocation {
    /// Map every job attribute to exactly one pipeline flag.
    pub fn build(index: usize, program: &Program, job: &SiteJob) -> Self {
        let flags = vec![
            PipelineFlag::path(FLAG_OUTPUT_PATH, &job.output_path),
            PipelineFlag::path(FLAG_TEMPLATES_DIR, &job.templates_dir),
            PipelineFlag {
                flag: FLAG_BOUNDS.to_string(),
                values: job.bounds.to_args(),
            },
            PipelineFlag::path(FLAG_METADATA_CSV, &job.metadata_csv),
            PipelineFlag::single(FLAG_DENSECLOUD_QUALITY, job.densecloud_quality),
            PipelineFlag::single(FLAG_IMAGE_MATCHING_ACCURACY, job.image_matching_accuracy),
            PipelineFlag::single(FLAG_OUTPUT_RESOLUTION, job.output_resolution),
            PipelineFlag::single(FLAG_PIXEL_PITCH, job.pixel_pitch),
            PipelineFlag::single(FLAG_PARALLELIZATION, job.parallelization),
            PipelineFlag::path(FLAG_REFERENCE_DEM_4D, &job.reference_dem_4d),
            PipelineFlag::path(FLAG_REFERENCE_DEM, &job.reference_dem),
            PipelineFlag::path(FLAG_LICENSE_PATH, &job.license_path),
        ];

        Self {
            index,
            site: job.name.clone(),
            program: program.clone(),
            flags,
        }
    }

    /// Values passed after a flag, if the flag is present
    pub fn values_of(&self, flag: &str) -> Option<&[String]> {
        self.flags
            .iter()
            .find(|f| f.flag == flag)
            .map(|f| f.values.as_slice())
    }

    /// Arguments after the program name
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.program.args.clone();
        for flag in &self.flags {
            argv.push(flag.flag.clone());
            argv.extend(flag.values.iter().cloned());
        }
        argv
    }

    /// Shell-quoted command line, suitable for copying into a terminal
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.command.clone())
            .chain(self.argv())
            .map(|arg| escape(Cow::Owned(arg)).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
