use crate::output::OutputWriter;
use crate::output_types::RunOutput;
use tabled::Tabled;
use timesift_batch_core::models::{BatchReport, JobOutcome};

/// One table row per dispatched site
#[derive(Debug, Clone, Tabled)]
pub struct OutcomeRow {
    #[tabled(rename = "#")]
    pub position: usize,
    #[tabled(rename = "Site")]
    pub site: String,
    #[tabled(rename = "Output")]
    pub output_path: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Duration")]
    pub duration: String,
}

impl From<&JobOutcome> for OutcomeRow {
    fn from(outcome: &JobOutcome) -> Self {
        Self {
            position: outcome.index + 1,
            site: outcome.site.clone(),
            output_path: outcome.output_path.display().to_string(),
            status: outcome.status.label(),
            duration: format_duration(outcome.duration.as_secs()),
        }
    }
}

/// Render whole seconds as `1h 02m 03s`, `4m 05s` or `6s`
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

pub fn run_output(report: &BatchReport) -> RunOutput {
    RunOutput {
        run_id: report.run_id.to_string(),
        total: report.total(),
        succeeded: report.success_count(),
        failed: report.failure_count(),
        skipped: report.skipped_count(),
        outcomes: report.outcomes.clone(),
    }
}

/// Display the batch report to output
pub fn display_report(output: &OutputWriter, report: &BatchReport) -> anyhow::Result<()> {
    if output.is_json() {
        return output.result(run_output(report));
    }

    output.section("Batch Summary");
    output.kv("Run", report.run_id);
    output.kv("Total Sites", report.total());
    output.kv("Succeeded", report.success_count());
    output.kv("Failed", report.failure_count());
    if report.skipped_count() > 0 {
        output.kv("Skipped", report.skipped_count());
    }

    if report.total() > 0 {
        output.section("Sites");
        output.table(report.outcomes.iter().map(OutcomeRow::from).collect());
    }

    if !report.all_succeeded() {
        output.section("Unsuccessful Sites");
        for outcome in report.failures() {
            output.error(format!(
                "{} ({}) - {}",
                outcome.site,
                outcome.output_path.display(),
                outcome.status.label()
            ));
        }
    }

    Ok(())
}
