//! Launcher port
//!
//! A launcher turns one [`Invocation`] into one finished pipeline run. The
//! dispatcher only sees the resulting [`JobStatus`]; spawn failures and
//! non-zero exits are data, not errors.

pub mod process;
pub mod recording;

pub use process::ProcessLauncher;
pub use recording::RecordingLauncher;

use crate::models::{Invocation, JobStatus};
use async_trait::async_trait;

/// Port for starting the external pipeline
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Run the invocation to completion and report how it ended
    async fn launch(&self, invocation: &Invocation) -> JobStatus;
}
