pub mod bounds;
pub mod invocation;
pub mod job;
pub mod outcome;

pub use bounds::Bounds;
pub use invocation::{Invocation, PipelineFlag, Program};
pub use job::SiteJob;
pub use outcome::{BatchReport, JobOutcome, JobStatus};
