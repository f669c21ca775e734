use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use timesift_batch_core::dispatcher::DispatchObserver;
use timesift_batch_core::models::{Invocation, JobOutcome};

/// Create a progress bar for determinate progress
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{msg}\n[{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {elapsed_precise}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Progress display for a dispatch; one tick per finished site
pub struct BatchProgress {
    bar: ProgressBar,
    running: Mutex<Vec<String>>,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            bar: create_progress_bar(total as u64, "Waiting for first site..."),
            running: Mutex::new(Vec::new()),
        }
    }

    /// Hidden progress for JSON output
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            running: Mutex::new(Vec::new()),
        }
    }

    fn refresh_message(&self, running: &[String]) {
        if running.is_empty() {
            self.bar.set_message("Idle");
        } else {
            self.bar.set_message(format!("Running: {}", running.join(", ")));
        }
    }

    /// Leave the bar where it stopped
    pub fn abandon(&self) {
        self.bar.abandon_with_message("Interrupted");
    }

    pub fn finish(&self, succeeded: usize, total: usize) {
        self.bar
            .finish_with_message(format!("✓ {} of {} sites succeeded", succeeded, total));
    }
}

impl DispatchObserver for BatchProgress {
    fn job_started(&self, _index: usize, invocation: &Invocation) {
        if let Ok(mut running) = self.running.lock() {
            running.push(invocation.site.clone());
            self.refresh_message(&running);
        }
    }

    fn job_finished(&self, outcome: &JobOutcome) {
        if let Ok(mut running) = self.running.lock() {
            running.retain(|site| site != &outcome.site);
            self.refresh_message(&running);
        }
        let mark = if outcome.status.is_success() { "✓" } else { "✗" };
        self.bar
            .println(format!("{} {} - {}", mark, outcome.site, outcome.status.label()));
        self.bar.inc(1);
    }
}
