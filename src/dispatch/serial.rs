use super::{run_task, BatchReport, DispatchOutcome, TaskHandler};
use crate::error::Result;
use crate::pipeline::PipelineExecutor;
use crate::queue::Task;
use async_trait::async_trait;
use tracing::info;

/// Runs tasks in queue order, one at a time
pub struct SerialHandler {
    executor: PipelineExecutor,
}

impl SerialHandler {
    pub fn new(executor: PipelineExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl TaskHandler for SerialHandler {
    async fn dispatch(&self, tasks: &[Task]) -> Result<DispatchOutcome> {
        let mut report = BatchReport::default();
        for task in tasks {
            info!(
                "Processing {} of {}: {}",
                task.sequence_id,
                tasks.len(),
                task.name
            );
            let status = run_task(&self.executor, task).await;
            report.record(task.name.clone(), status);
        }

        report.log_failures();
        Ok(DispatchOutcome::Completed(report))
    }
}
