//! Init command implementation

use crate::cli::InitArgs;
use crate::dry_run::{display_planned_actions, ActionType, PlannedAction};
use crate::output::OutputWriter;
use crate::output_types::InitOutput;
use anyhow::{bail, Context, Result};
use std::fs;

/// Template written by `init`: three sites sharing one set of defaults
pub const TEMPLATE: &str = r#"# timesift-batch job file
#
# One [[site]] per pipeline run. Any parameter can be set once in [defaults]
# and overridden per site. Sites run in the order listed.

[dispatch]
# Program that starts the pipeline. To run the script through python:
#   program = "python"
#   program_args = ["hsfm/timesift/timesift.py"]
program = "timesift"

# Number of sites running at once (1 = one after another)
concurrency = 1

# Stop launching new sites after the first failure
fail_fast = false

# Kill a site's pipeline after this many seconds
# timeout_secs = 86400

# Write each site's output to <log_dir>/<NN>-<site>.log
# log_dir = "logs"

[defaults]
templates_dir = "input_data/fiducials/nagap"
metadata_csv = "input_data/nagap_image_metadata.csv"
# Metashape tiers: 1 (highest) to 4 (lowest)
densecloud_quality = 2
image_matching_accuracy = 1
output_resolution = 1
# Sensor pixel size in millimetres
pixel_pitch = 0.02
# Worker count used inside the pipeline
parallelization = 2
reference_dem_4d = "reference_dem_highres/reference_dem_4d.tif"
reference_dem = "reference_dem_highres/reference_dem.tif"
license_path = "uw_agisoft.lic"

# bounds = [west, south, east, north]; values are forwarded exactly as written

[[site]]
name = "mt_baker"
output_path = "output/mt_baker"
bounds = [-121.94, 48.84, -121.70, 48.70]

[[site]]
name = "mt_rainier"
output_path = "output/mt_rainier"
bounds = [-121.94, 46.95, -121.60, 46.75]

[[site]]
name = "glacier_peak"
output_path = "output/glacier_peak"
bounds = [-121.18, 48.16, -121.06, 48.07]
"#;

const TEMPLATE_SITES: usize = 3;

pub fn execute(args: InitArgs, output: &OutputWriter, dry_run: bool) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "Job file already exists at {}. Use --force to overwrite",
            args.path.display()
        );
    }

    if dry_run {
        let actions = vec![PlannedAction::new(
            ActionType::CreateFile,
            format!("Create job file {}", args.path.display()),
        )
        .with_detail(format!("Sites: {}", TEMPLATE_SITES))
        .with_detail("Program: timesift")];

        return display_planned_actions(output, &actions);
    }

    if let Some(parent) = args.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    fs::write(&args.path, TEMPLATE)
        .with_context(|| format!("Failed to write {}", args.path.display()))?;

    if output.is_json() {
        output.result(InitOutput {
            path: args.path.display().to_string(),
            sites: TEMPLATE_SITES,
        })?;
    } else {
        output.success(format!("Wrote job file {}", args.path.display()));
        output.kv("Sites", TEMPLATE_SITES);
        output.info(format!(
            "Edit the paths, then check it with: timesift-batch validate {}",
            args.path.display()
        ));
    }

    Ok(())
}
