use crate::error::{BatchError, Result};
use crate::models::Bounds;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parameters for one pipeline run over one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteJob {
    /// Label used in logs and reports; never forwarded to the pipeline
    pub name: String,

    /// Destination for pipeline artifacts
    pub output_path: PathBuf,

    /// Fiducial template references
    pub templates_dir: PathBuf,

    /// Region of interest
    pub bounds: Bounds,

    /// Image metadata table
    pub metadata_csv: PathBuf,

    pub densecloud_quality: u32,

    pub image_matching_accuracy: u32,

    pub output_resolution: f64,

    /// Sensor pixel size in millimetres
    pub pixel_pitch: f64,

    /// Worker count hint for the pipeline's own concurrency
    pub parallelization: u32,

    /// Time-variant reference elevation raster
    pub reference_dem_4d: PathBuf,

    /// Single-epoch reference elevation raster
    pub reference_dem: PathBuf,

    pub license_path: PathBuf,
}

impl SiteJob {
    /// Check the numeric invariants of the job.
    ///
    /// Paths are not checked here; they only have to exist when the
    /// pipeline itself runs.
    pub fn check(&self) -> Result<()> {
        self.bounds
            .check_degenerate()
            .map_err(|reason| BatchError::DegenerateBounds {
                site: self.name.clone(),
                bounds: self.bounds.to_string(),
                reason,
            })?;

        self.require_positive_int("densecloud_quality", self.densecloud_quality)?;
        self.require_positive_int("image_matching_accuracy", self.image_matching_accuracy)?;
        self.require_positive_int("parallelization", self.parallelization)?;
        self.require_positive_float("output_resolution", self.output_resolution)?;
        self.require_positive_float("pixel_pitch", self.pixel_pitch)?;

        Ok(())
    }

    fn require_positive_int(&self, field: &'static str, value: u32) -> Result<()> {
        if value == 0 {
            return Err(self.invalid(field, "must be at least 1".to_string()));
        }
        Ok(())
    }

    fn require_positive_float(&self, field: &'static str, value: f64) -> Result<()> {
        if !value.is_finite() || value <= 0.0 {
            return Err(self.invalid(field, format!("must be a positive number, got {}", value)));
        }
        Ok(())
    }

    fn invalid(&self, field: &'static str, reason: String) -> BatchError {
        BatchError::InvalidValue {
            site: self.name.clone(),
            field,
            reason,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::site_job;
    use super::*;

    #[test]
    fn test_valid_job_passes_check() {
        assert!(site_job("baker").check().is_ok());
    }

    #[test]
    fn test_zero_parallelization_rejected() {
        let mut job = site_job("baker");
        job.parallelization = 0;
        match job.check() {
            Err(BatchError::InvalidValue { field, .. }) => assert_eq!(field, "parallelization"),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_resolution_rejected() {
        let mut job = site_job("baker");
        job.output_resolution = 0.0;
        assert!(job.check().is_err());

        let mut job = site_job("baker");
        job.pixel_pitch = -0.02;
        assert!(job.check().is_err());
    }

    #[test]
    fn test_degenerate_bounds_rejected() {
        let mut job = site_job("baker");
        job.bounds = Bounds::new(-121.94, 48.84, -121.94, 48.70);
        assert!(matches!(job.check(), Err(BatchError::DegenerateBounds { .. })));
    }

    #[test]
    fn test_inverted_bounds_are_not_an_error() {
        let mut job = site_job("baker");
        job.bounds = Bounds::new(-121.70, 48.70, -121.94, 48.84);
        assert!(job.check().is_ok());
        assert_eq!(job.bounds.west(), -121.70);
    }
}
