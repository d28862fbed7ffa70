//! Batch configuration: output options, dispatch selection, tool commands
//! and the checks that reject a bad configuration before any task runs.

pub mod loader;
pub mod options;
pub mod validation;

pub use loader::ToolConfig;
pub use options::{BitDepth, OutputOptions, Stretch};
pub use validation::{resolve_dispatch_mode, validate_destination, validate_epsg};

use std::path::PathBuf;

/// Execution backend for a batch. Exactly one is selected per run.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchMode {
    Serial,
    LocalParallel { workers: usize },
    Cluster {
        resources: Option<String>,
        qsub_script: PathBuf,
    },
}
