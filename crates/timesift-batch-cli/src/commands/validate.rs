//! Validate command implementation

use crate::cli::ValidateArgs;
use crate::config_loader::load_batch;
use crate::output::OutputWriter;
use crate::output_types::{ConfigValue, ValidateOutput};
use anyhow::Result;
use tabled::Tabled;
use timesift_batch_core::config::CliConfigOverrides;
use timesift_batch_core::models::SiteJob;
use timesift_batch_core::validation::{validate_jobs, ValidationOptions};

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Output")]
    output_path: String,
    #[tabled(rename = "Bounds")]
    bounds: String,
    #[tabled(rename = "Quality")]
    densecloud_quality: u32,
    #[tabled(rename = "Accuracy")]
    image_matching_accuracy: u32,
    #[tabled(rename = "Resolution")]
    output_resolution: f64,
    #[tabled(rename = "Parallelization")]
    parallelization: u32,
}

impl JobRow {
    fn new(position: usize, job: &SiteJob) -> Self {
        Self {
            position,
            site: job.name.clone(),
            output_path: job.output_path.display().to_string(),
            bounds: job.bounds.to_string(),
            densecloud_quality: job.densecloud_quality,
            image_matching_accuracy: job.image_matching_accuracy,
            output_resolution: job.output_resolution,
            parallelization: job.parallelization,
        }
    }
}

pub fn execute(args: ValidateArgs, output: &OutputWriter) -> Result<()> {
    let loaded = load_batch(&args.jobs_file, CliConfigOverrides::default())?;
    let jobs = &loaded.job_file.jobs;
    let issues = validate_jobs(
        jobs,
        ValidationOptions {
            check_paths: args.check_paths,
        },
    );
    let config = loaded.config.to_inspection_map();

    if output.is_json() {
        let json_output = ValidateOutput {
            jobs_file: args.jobs_file.display().to_string(),
            job_count: jobs.len(),
            issues,
            config: config
                .into_iter()
                .map(|(key, (value, source))| {
                    (
                        key,
                        ConfigValue {
                            value,
                            source: format!("{:?}", source),
                        },
                    )
                })
                .collect(),
        };
        return output.result(json_output);
    }

    output.section("Sites");
    output.table(
        jobs.iter()
            .enumerate()
            .map(|(i, job)| JobRow::new(i + 1, job))
            .collect(),
    );

    output.section("Dispatch Configuration");
    for (key, (value, source)) in &config {
        output.kv(key, format!("{} ({:?})", value, source));
    }

    output.section("Checks");
    if issues.is_empty() {
        output.success(format!("{} sites loaded, no issues found", jobs.len()));
    } else {
        for issue in &issues {
            output.warning(format!("{}: {}", issue.site, issue.message));
        }
        output.info(format!(
            "{} sites loaded with {} warnings; bounds are forwarded exactly as written",
            jobs.len(),
            issues.len()
        ));
    }

    Ok(())
}
