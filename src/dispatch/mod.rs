//! Batch dispatch.
//!
//! A [`TaskHandler`] consumes the whole task queue with one of three
//! backends: [`SerialHandler`] runs tasks one after another,
//! [`ParallelHandler`] runs them on a bounded worker pool, and
//! [`ClusterHandler`] submits each task to the cluster scheduler and returns
//! without waiting. Only the local backends can report per-task status.

pub mod cluster;
pub mod dry_run;
pub mod parallel;
pub mod serial;

pub use cluster::ClusterHandler;
pub use dry_run::render_plan;
pub use parallel::ParallelHandler;
pub use serial::SerialHandler;

use crate::error::Result;
use crate::pipeline::{PipelineExecutor, TaskLog};
use crate::queue::Task;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::warn;

/// Per-task status codes keyed by task name, 0 meaning success
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    statuses: BTreeMap<String, i32>,
}

impl BatchReport {
    pub fn record(&mut self, name: impl Into<String>, status: i32) {
        self.statuses.insert(name.into(), status);
    }

    pub fn statuses(&self) -> &BTreeMap<String, i32> {
        &self.statuses
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Names of tasks with a nonzero status, in name order
    pub fn failed(&self) -> Vec<&str> {
        self.statuses
            .iter()
            .filter(|(_, status)| **status != 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.statuses.values().all(|status| *status == 0)
    }

    /// Log one warning per failed task
    pub fn log_failures(&self) {
        for name in self.failed() {
            warn!("Failed Image: {}", name);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Tasks ran in this process
    Completed(BatchReport),
    /// Tasks were handed to the scheduler; completion is not observed
    Submitted {
        submitted: usize,
        rejected: Vec<String>,
    },
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn dispatch(&self, tasks: &[Task]) -> Result<DispatchOutcome>;
}

/// Run one task with its own log file, returning its status code.
///
/// Opening and flushing the log are blocking calls on the worker thread.
pub(crate) async fn run_task(executor: &PipelineExecutor, task: &Task) -> i32 {
    let log_path = task.request.paths.task_log();
    let log = match TaskLog::attach(&log_path, task.name.as_str()) {
        Ok(log) => log,
        Err(e) => {
            warn!("Cannot open task log {}: {}", log_path.display(), e);
            TaskLog::discard(task.name.as_str())
        }
    };

    let report = executor.run(&task.request, &log).await;

    if let Err(e) = log.detach() {
        warn!("Cannot flush task log {}: {}", log_path.display(), e);
    }
    report.status()
}
