//! Per-image pipeline.
//!
//! [`PipelineExecutor`] runs the stage sequence for one [`PipelineRequest`]
//! and reports a [`PipelineReport`]. Progress goes to a [`TaskLog`] owned by
//! the caller, one per task.
//!
//! [`PipelineRequest`]: crate::queue::PipelineRequest

pub mod executor;
pub mod log;
pub mod stage;

pub use executor::{PipelineExecutor, MUL_RESOLUTION_FACTOR};
pub use log::{LogLevel, TaskLog};
pub use stage::{PipelineReport, Stage, StageResult};
