//! Subprocess abstraction used for every external tool invocation.
//!
//! Production code runs commands through [`TokioProcessRunner`]; tests swap in
//! [`MockProcessRunner`] to record invocations and script their replies.

pub mod builder;
pub mod error;
pub mod mock;
pub mod runner;

#[cfg(test)]
mod tests;

pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use mock::{MockProcessRunner, MockReply};
pub use runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner, TokioProcessRunner};

use std::sync::Arc;

/// Shared handle to the runner all tools and handlers go through
#[derive(Clone)]
pub struct SubprocessManager {
    runner: Arc<dyn ProcessRunner>,
}

impl SubprocessManager {
    pub fn production() -> Self {
        Self {
            runner: Arc::new(TokioProcessRunner),
        }
    }

    /// Manager backed by a fresh mock, plus a handle for scripting it
    pub fn mock() -> (Self, MockProcessRunner) {
        let mock = MockProcessRunner::new();
        let manager = Self {
            runner: Arc::new(mock.clone()),
        };
        (manager, mock)
    }

    pub async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.runner.run(command).await
    }
}
