use super::{run_task, BatchReport, DispatchOutcome, TaskHandler};
use crate::error::{ErrorCode, PanbatchError, Result};
use crate::pipeline::PipelineExecutor;
use crate::queue::Task;
use async_trait::async_trait;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Runs tasks on a pool of `workers` concurrent pipelines.
///
/// Tasks never share output paths, so workers need no coordination beyond
/// the pool bound.
pub struct ParallelHandler {
    executor: PipelineExecutor,
    workers: usize,
}

impl ParallelHandler {
    pub fn new(executor: PipelineExecutor, workers: usize) -> Self {
        Self {
            executor,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    ) {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb
}

#[async_trait]
impl TaskHandler for ParallelHandler {
    async fn dispatch(&self, tasks: &[Task]) -> Result<DispatchOutcome> {
        info!(
            "Processing {} tasks with {} workers",
            tasks.len(),
            self.workers
        );

        let progress_bar = create_progress_bar(tasks.len());
        progress_bar.set_message("Pansharpening");
        let semaphore = Arc::new(Semaphore::new(self.workers));

        let futures = tasks.iter().map(|task| {
            let semaphore = semaphore.clone();
            let progress = progress_bar.clone();
            async move {
                let _permit = semaphore.acquire().await.map_err(|e| {
                    PanbatchError::dispatch(
                        ErrorCode::DISPATCH_GENERIC,
                        format!("Worker pool closed: {}", e),
                    )
                })?;
                debug!("Worker started {}", task.name);
                let status = run_task(&self.executor, task).await;
                progress.inc(1);
                Ok::<_, PanbatchError>((task.name.clone(), status))
            }
        });

        let results = join_all(futures).await;

        let mut report = BatchReport::default();
        for result in results {
            let (name, status) = result?;
            report.record(name, status);
        }

        progress_bar.finish_with_message(format!(
            "Completed: {} successful, {} failed",
            report.len() - report.failed().len(),
            report.failed().len()
        ));
        report.log_failures();
        Ok(DispatchOutcome::Completed(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::SourceSpec;
    use crate::queue::TaskQueueBuilder;
    use crate::testing::{default_options, write_wv02_pair, FakeToolchain};
    use crate::dispatch::SerialHandler;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn product_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with("_pansh.tif"))
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_parallel_matches_serial_outputs() {
        let src = TempDir::new().unwrap();
        let serial_dst = TempDir::new().unwrap();
        let parallel_dst = TempDir::new().unwrap();
        for i in 0..10 {
            write_wv02_pair(src.path(), i).unwrap();
        }
        let source = SourceSpec::Directory(src.path().to_path_buf());

        let serial_queue = TaskQueueBuilder::new(serial_dst.path(), default_options())
            .build(&source)
            .unwrap();
        let serial = Arc::new(FakeToolchain::new());
        SerialHandler::new(serial.executor())
            .dispatch(&serial_queue.tasks)
            .await
            .unwrap();

        let parallel_queue = TaskQueueBuilder::new(parallel_dst.path(), default_options())
            .build(&source)
            .unwrap();
        assert_eq!(parallel_queue.len(), 10);
        let parallel = Arc::new(FakeToolchain::new().with_delay(Duration::from_millis(20)));
        let outcome = ParallelHandler::new(parallel.executor(), 4)
            .dispatch(&parallel_queue.tasks)
            .await
            .unwrap();

        let DispatchOutcome::Completed(report) = outcome else {
            panic!("parallel dispatch must complete");
        };
        assert_eq!(report.len(), 10);
        assert!(report.is_success());
        assert_eq!(product_names(serial_dst.path()), product_names(parallel_dst.path()));
        assert_eq!(product_names(parallel_dst.path()).len(), 10);
        for task in &parallel_queue.tasks {
            let content = std::fs::read(&task.request.paths.pansharp_final_output).unwrap();
            assert_eq!(content, b"pansharpened");
            assert!(!task.request.paths.pansharp_temp_output.exists());
        }
    }

    #[tokio::test]
    async fn test_pool_bound_is_respected() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        for i in 0..8 {
            write_wv02_pair(src.path(), i).unwrap();
        }
        let queue = TaskQueueBuilder::new(dst.path(), default_options())
            .build(&SourceSpec::Directory(src.path().to_path_buf()))
            .unwrap();
        let fake = Arc::new(FakeToolchain::new().with_delay(Duration::from_millis(30)));

        ParallelHandler::new(fake.executor(), 3)
            .dispatch(&queue.tasks)
            .await
            .unwrap();

        assert!(fake.max_concurrency() <= 3);
        assert!(fake.max_concurrency() >= 2);
    }

    #[test]
    fn test_zero_workers_clamped() {
        let fake = Arc::new(FakeToolchain::new());
        assert_eq!(ParallelHandler::new(fake.executor(), 0).workers(), 1);
    }
}
