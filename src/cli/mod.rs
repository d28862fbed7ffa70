//! Command line entry point
//!
//! - Argument parsing structures
//! - Single-image argument reconstruction for cluster jobs
//! - The batch run itself

pub mod args;
pub mod batch;

pub use args::Cli;
pub use batch::{exit_code_for, run, run_with};
