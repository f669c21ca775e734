//! Advisory checks over a loaded job list.
//!
//! Nothing here changes a job. Hard invariants (positive knobs, non-degenerate
//! bounds) are enforced when the job file is loaded; these checks only
//! report things worth a second look before a long batch starts.

use crate::models::SiteJob;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Documented tier range of the pipeline's quality/accuracy knobs
pub const TIER_RANGE: std::ops::RangeInclusive<u32> = 1..=4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    LongitudeInverted,
    LatitudeInverted,
    DuplicateOutputPath,
    DuplicateSiteName,
    TierOutOfRange,
    PathMissing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub site: String,
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    fn new(job: &SiteJob, kind: IssueKind, message: String) -> Self {
        Self {
            site: job.name.clone(),
            kind,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Also report input paths that do not exist on this machine
    pub check_paths: bool,
}

/// Collect advisory issues for every job, in job order
pub fn validate_jobs(jobs: &[SiteJob], options: ValidationOptions) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut seen_outputs: HashMap<&Path, &str> = HashMap::new();
    let mut seen_names: HashMap<&str, usize> = HashMap::new();

    for job in jobs {
        check_bounds(job, &mut issues);
        check_tiers(job, &mut issues);

        match seen_outputs.get(job.output_path.as_path()) {
            Some(first) => issues.push(ValidationIssue::new(
                job,
                IssueKind::DuplicateOutputPath,
                format!(
                    "output path {} is also used by site '{}'",
                    job.output_path.display(),
                    first
                ),
            )),
            None => {
                seen_outputs.insert(job.output_path.as_path(), job.name.as_str());
            }
        }

        match seen_names.get(job.name.as_str()).copied() {
            Some(count) => {
                issues.push(ValidationIssue::new(
                    job,
                    IssueKind::DuplicateSiteName,
                    format!(
                        "site name '{}' is used {} times; reports will be ambiguous",
                        job.name,
                        count + 1
                    ),
                ));
                seen_names.insert(job.name.as_str(), count + 1);
            }
            None => {
                seen_names.insert(job.name.as_str(), 1);
            }
        }

        if options.check_paths {
            check_paths(job, &mut issues);
        }
    }

    issues
}

fn check_bounds(job: &SiteJob, issues: &mut Vec<ValidationIssue>) {
    let bounds = job.bounds;
    if bounds.is_longitude_inverted() {
        issues.push(ValidationIssue::new(
            job,
            IssueKind::LongitudeInverted,
            format!(
                "bounds {}: west {} is greater than east {}",
                bounds,
                bounds.west(),
                bounds.east()
            ),
        ));
    }
    if bounds.is_latitude_inverted() {
        issues.push(ValidationIssue::new(
            job,
            IssueKind::LatitudeInverted,
            format!(
                "bounds {}: second latitude {} is greater than fourth {} (upper-left/lower-right ordering?)",
                bounds,
                bounds.south(),
                bounds.north()
            ),
        ));
    }
}

fn check_tiers(job: &SiteJob, issues: &mut Vec<ValidationIssue>) {
    for (field, value) in [
        ("densecloud_quality", job.densecloud_quality),
        ("image_matching_accuracy", job.image_matching_accuracy),
    ] {
        if !TIER_RANGE.contains(&value) {
            issues.push(ValidationIssue::new(
                job,
                IssueKind::TierOutOfRange,
                format!(
                    "{} = {} is outside {}-{}",
                    field,
                    value,
                    TIER_RANGE.start(),
                    TIER_RANGE.end()
                ),
            ));
        }
    }
}

fn check_paths(job: &SiteJob, issues: &mut Vec<ValidationIssue>) {
    for (field, path) in [
        ("templates_dir", &job.templates_dir),
        ("metadata_csv", &job.metadata_csv),
        ("reference_dem_4d", &job.reference_dem_4d),
        ("reference_dem", &job.reference_dem),
        ("license_path", &job.license_path),
    ] {
        if !path.exists() {
            issues.push(ValidationIssue::new(
                job,
                IssueKind::PathMissing,
                format!("{} {} does not exist", field, path.display()),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::fixtures::site_job;
    use crate::models::Bounds;

    fn kinds(issues: &[ValidationIssue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_well_ordered_bounds_have_no_issues() {
        let mut job = site_job("a");
        job.bounds = Bounds::new(-121.94, 48.70, -121.70, 48.84);
        assert!(validate_jobs(&[job], ValidationOptions::default()).is_empty());
    }

    #[test]
    fn test_inverted_bounds_flagged_not_fixed() {
        let mut job = site_job("a");
        job.bounds = Bounds::new(-121.70, 48.84, -121.94, 48.70);
        let jobs = vec![job];

        let issues = validate_jobs(&jobs, ValidationOptions::default());

        assert_eq!(
            kinds(&issues),
            vec![IssueKind::LongitudeInverted, IssueKind::LatitudeInverted]
        );
        assert_eq!(jobs[0].bounds, Bounds::new(-121.70, 48.84, -121.94, 48.70));
    }

    #[test]
    fn test_duplicate_output_path() {
        let mut a = site_job("a");
        let mut b = site_job("b");
        a.bounds = Bounds::new(0.0, 0.0, 1.0, 1.0);
        b.bounds = Bounds::new(0.0, 0.0, 1.0, 1.0);
        b.output_path = a.output_path.clone();

        let issues = validate_jobs(&[a, b], ValidationOptions::default());

        assert_eq!(kinds(&issues), vec![IssueKind::DuplicateOutputPath]);
        assert_eq!(issues[0].site, "b");
        assert!(issues[0].message.contains("'a'"));
    }

    #[test]
    fn test_duplicate_site_name() {
        let mut a = site_job("site-3");
        let mut b = site_job("site-3");
        a.bounds = Bounds::new(0.0, 0.0, 1.0, 1.0);
        b.bounds = Bounds::new(0.0, 0.0, 1.0, 1.0);
        b.output_path = "output/other".into();

        let issues = validate_jobs(&[a, b], ValidationOptions::default());

        assert_eq!(kinds(&issues), vec![IssueKind::DuplicateSiteName]);
        assert!(issues[0].message.contains("used 2 times"));
    }

    #[test]
    fn test_tier_out_of_range() {
        let mut job = site_job("a");
        job.bounds = Bounds::new(0.0, 0.0, 1.0, 1.0);
        job.densecloud_quality = 5;

        let issues = validate_jobs(&[job], ValidationOptions::default());
        assert_eq!(kinds(&issues), vec![IssueKind::TierOutOfRange]);
    }

    #[test]
    fn test_missing_paths_only_when_requested() {
        let mut job = site_job("a");
        job.bounds = Bounds::new(0.0, 0.0, 1.0, 1.0);
        let jobs = vec![job];

        assert!(validate_jobs(&jobs, ValidationOptions::default()).is_empty());

        let issues = validate_jobs(&jobs, ValidationOptions { check_paths: true });
        assert_eq!(issues.len(), 5);
        assert!(issues.iter().all(|i| i.kind == IssueKind::PathMissing));
    }
}
