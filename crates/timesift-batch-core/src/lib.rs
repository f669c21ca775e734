//! timesift-batch core - Site jobs, invocations, dispatch and configuration
//!
//! This crate contains the domain model and the dispatcher that launches one
//! external `timesift` pipeline process per site job.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod jobfile;
pub mod launcher;
pub mod models;
pub mod validation;

pub use dispatcher::Dispatcher;
pub use error::{BatchError, Result};
