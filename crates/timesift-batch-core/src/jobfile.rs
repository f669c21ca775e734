//! Job file loading.
//!
//! A job file holds an optional `[dispatch]` table, an optional `[defaults]`
//! table and an ordered list of `[[site]]` records. Each site is merged
//! field by field over the defaults; after merging every pipeline parameter
//! must be present.
//!
//! ```toml
//! [dispatch]
//! program = "python"
//! program_args = ["hsfm/timesift/timesift.py"]
//!
//! [defaults]
//! templates_dir = "input_data/fiducials/nagap"
//! pixel_pitch = 0.02
//!
//! [[site]]
//! name = "mt_baker"
//! output_path = "output/mt_baker"
//! bounds = [-121.94, 48.84, -121.70, 48.70]
//! ```

use crate::config::DispatchSection;
use crate::error::{BatchError, Result};
use crate::models::{Bounds, SiteJob};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Serialization format of a job file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFileFormat {
    Toml,
    Json,
}

impl JobFileFormat {
    /// Pick the format from the file extension; anything but `.json` is TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => JobFileFormat::Json,
            _ => JobFileFormat::Toml,
        }
    }
}

/// A site record as written in the file; every field may come from `[defaults]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiteRecord {
    pub name: Option<String>,
    pub output_path: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub bounds: Option<Bounds>,
    pub metadata_csv: Option<PathBuf>,
    pub densecloud_quality: Option<u32>,
    pub image_matching_accuracy: Option<u32>,
    pub output_resolution: Option<f64>,
    pub pixel_pitch: Option<f64>,
    pub parallelization: Option<u32>,
    pub reference_dem_4d: Option<PathBuf>,
    pub reference_dem: Option<PathBuf>,
    pub license_path: Option<PathBuf>,
}

impl SiteRecord {
    /// Fill every unset field from `defaults`. The name is never inherited.
    pub fn merged_over(self, defaults: &SiteRecord) -> SiteRecord {
        SiteRecord {
            name: self.name,
            output_path: self.output_path.or_else(|| defaults.output_path.clone()),
            templates_dir: self.templates_dir.or_else(|| defaults.templates_dir.clone()),
            bounds: self.bounds.or(defaults.bounds),
            metadata_csv: self.metadata_csv.or_else(|| defaults.metadata_csv.clone()),
            densecloud_quality: self.densecloud_quality.or(defaults.densecloud_quality),
            image_matching_accuracy: self
                .image_matching_accuracy
                .or(defaults.image_matching_accuracy),
            output_resolution: self.output_resolution.or(defaults.output_resolution),
            pixel_pitch: self.pixel_pitch.or(defaults.pixel_pitch),
            parallelization: self.parallelization.or(defaults.parallelization),
            reference_dem_4d: self.reference_dem_4d.or_else(|| defaults.reference_dem_4d.clone()),
            reference_dem: self.reference_dem.or_else(|| defaults.reference_dem.clone()),
            license_path: self.license_path.or_else(|| defaults.license_path.clone()),
        }
    }

    /// Convert a merged record into a checked job. `index` is zero-based.
    pub fn into_job(self, index: usize) -> Result<SiteJob> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("site-{}", index + 1));

        let job = SiteJob {
            output_path: required(&name, "output_path", self.output_path)?,
            templates_dir: required(&name, "templates_dir", self.templates_dir)?,
            bounds: required(&name, "bounds", self.bounds)?,
            metadata_csv: required(&name, "metadata_csv", self.metadata_csv)?,
            densecloud_quality: required(&name, "densecloud_quality", self.densecloud_quality)?,
            image_matching_accuracy: required(
                &name,
                "image_matching_accuracy",
                self.image_matching_accuracy,
            )?,
            output_resolution: required(&name, "output_resolution", self.output_resolution)?,
            pixel_pitch: required(&name, "pixel_pitch", self.pixel_pitch)?,
            parallelization: required(&name, "parallelization", self.parallelization)?,
            reference_dem_4d: required(&name, "reference_dem_4d", self.reference_dem_4d)?,
            reference_dem: required(&name, "reference_dem", self.reference_dem)?,
            license_path: required(&name, "license_path", self.license_path)?,
            name,
        };

        job.check()?;
        Ok(job)
    }
}

fn required<T>(site: &str, field: &'static str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| BatchError::MissingField {
        site: site.to_string(),
        field,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct JobFileDocument {
    #[serde(default)]
    dispatch: DispatchSection,
    #[serde(default)]
    defaults: SiteRecord,
    #[serde(default, rename = "site")]
    sites: Vec<SiteRecord>,
}

/// A loaded job file
#[derive(Debug, Clone)]
pub struct JobFile {
    pub path: PathBuf,
    pub dispatch: DispatchSection,
    pub jobs: Vec<SiteJob>,
}

/// Read and parse a job file from disk
pub fn load_job_file(path: &Path) -> Result<JobFile> {
    let content = fs::read_to_string(path).map_err(|source| BatchError::JobFileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let (dispatch, jobs) = parse_job_file(&content, JobFileFormat::from_path(path))
        .map_err(|e| match e {
            BatchError::JobFileParse { reason, .. } => BatchError::JobFileParse {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

    tracing::debug!("Loaded {} site jobs from {}", jobs.len(), path.display());

    Ok(JobFile {
        path: path.to_path_buf(),
        dispatch,
        jobs,
    })
}

/// Parse job file content, keeping the site order of the document
pub fn parse_job_file(content: &str, format: JobFileFormat) -> Result<(DispatchSection, Vec<SiteJob>)> {
    let document: JobFileDocument = match format {
        JobFileFormat::Toml => toml::from_str(content).map_err(|e| BatchError::JobFileParse {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?,
        JobFileFormat::Json => serde_json::from_str(content).map_err(|e| BatchError::JobFileParse {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?,
    };

    let jobs = document
        .sites
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.merged_over(&document.defaults).into_job(index))
        .collect::<Result<Vec<_>>>()?;

    Ok((document.dispatch, jobs))
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_SITES: &str = r#"
[dispatch]
program = "python"
program_args = ["hsfm/timesift/timesift.py"]

[defaults]
templates_dir = "input_data/fiducials/nagap"
metadata_csv = "input_data/nagap_image_metadata.csv"
densecloud_quality = 2
image_matching_accuracy = 1
output_resolution = 1
pixel_pitch = 0.02
parallelization = 2
reference_dem_4d = "reference_dem_highres/reference_dem_4d.tif"
reference_dem = "reference_dem_highres/reference_dem.tif"
license_path = "uw_agisoft.lic"

[[site]]
name = "mt_baker"
output_path = "output/mt_baker"
bounds = [-121.94, 48.84, -121.70, 48.70]

[[site]]
name = "mt_rainier"
output_path = "output/mt_rainier"
bounds = [-121.94, 46.95, -121.60, 46.75]
parallelization = 1

[[site]]
output_path = "output/glacier_peak"
bounds = [-121.18, 48.16, -121.06, 48.07]
"#;

    #[test]
    fn test_parse_keeps_site_order() {
        let (dispatch, jobs) = parse_job_file(THREE_SITES, JobFileFormat::Toml).unwrap();

        assert_eq!(dispatch.program.as_deref(), Some("python"));
        let names: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["mt_baker", "mt_rainier", "site-3"]);
    }

    #[test]
    fn test_sites_inherit_and_override_defaults() {
        let (_, jobs) = parse_job_file(THREE_SITES, JobFileFormat::Toml).unwrap();

        assert_eq!(jobs[0].parallelization, 2);
        assert_eq!(jobs[1].parallelization, 1);
        assert_eq!(jobs[2].templates_dir, PathBuf::from("input_data/fiducials/nagap"));
        assert_eq!(jobs[0].output_resolution, 1.0);
        assert_eq!(jobs[0].bounds, Bounds::new(-121.94, 48.84, -121.70, 48.70));
    }

    #[test]
    fn test_missing_field_reports_site_and_field() {
        let content = r#"
[[site]]
name = "lonely"
output_path = "output/lonely"
"#;
        match parse_job_file(content, JobFileFormat::Toml) {
            Err(BatchError::MissingField { site, field }) => {
                assert_eq!(site, "lonely");
                assert_eq!(field, "templates_dir");
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let content = r#"
[[site]]
output_pth = "typo"
"#;
        assert!(matches!(
            parse_job_file(content, JobFileFormat::Toml),
            Err(BatchError::JobFileParse { .. })
        ));
    }

    #[test]
    fn test_empty_document_has_no_jobs() {
        let (dispatch, jobs) = parse_job_file("", JobFileFormat::Toml).unwrap();
        assert!(jobs.is_empty());
        assert_eq!(dispatch, DispatchSection::default());
    }

    #[test]
    fn test_json_format() {
        let content = r#"{
            "defaults": {
                "templates_dir": "t", "metadata_csv": "m.csv",
                "densecloud_quality": 2, "image_matching_accuracy": 1,
                "output_resolution": 1.5, "pixel_pitch": 0.02, "parallelization": 2,
                "reference_dem_4d": "d4.tif", "reference_dem": "d.tif",
                "license_path": "l.lic"
            },
            "site": [
                { "name": "a", "output_path": "out/a", "bounds": [1.0, 2.0, 3.0, 4.0] }
            ]
        }"#;
        let (_, jobs) = parse_job_file(content, JobFileFormat::Json).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].output_resolution, 1.5);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(JobFileFormat::from_path(Path::new("jobs.json")), JobFileFormat::Json);
        assert_eq!(JobFileFormat::from_path(Path::new("jobs.toml")), JobFileFormat::Toml);
        assert_eq!(JobFileFormat::from_path(Path::new("jobs")), JobFileFormat::Toml);
    }
}
