//! Pipeline orchestration and its boundary types.

pub mod orchestrator;
pub mod types;

pub use orchestrator::PipelineOrchestrator;
pub use types::{AlignmentReport, PipelineFailure, PipelineOutcome, PipelineReport, PipelineResult};
