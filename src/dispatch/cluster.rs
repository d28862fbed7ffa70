use super::{DispatchOutcome, TaskHandler};
use crate::error::Result;
use crate::queue::Task;
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder, SubprocessManager};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Submits one scheduler job per task.
///
/// Each job re-runs this program on a single image, so a job under the
/// scheduler behaves like a local run of that image. Job completion is not
/// observed.
pub struct ClusterHandler {
    qsub_program: String,
    qsub_script: PathBuf,
    resources: Option<String>,
    /// Extra `NAME=value` pairs exported into every job
    forwarded_env: Vec<(String, String)>,
    subprocess: SubprocessManager,
}

impl ClusterHandler {
    pub fn new(
        qsub_program: impl Into<String>,
        qsub_script: impl Into<PathBuf>,
        resources: Option<String>,
        subprocess: SubprocessManager,
    ) -> Self {
        Self {
            qsub_program: qsub_program.into(),
            qsub_script: qsub_script.into(),
            resources,
            forwarded_env: Vec::new(),
            subprocess,
        }
    }

    pub fn with_env(mut self, vars: Vec<(String, String)>) -> Self {
        self.forwarded_env = vars;
        self
    }

    /// `qsub [-l <resources>] -N <job> -v p1="<invocation>"[,NAME="value"...] <script>`
    pub fn submit_command(&self, task: &Task) -> ProcessCommand {
        let mut builder = ProcessCommandBuilder::new(self.qsub_program.as_str());
        if let Some(resources) = &self.resources {
            builder = builder.option("-l", resources);
        }
        // Values are quoted so embedded commas are not read as variable separators
        let mut variables = format!("p1=\"{}\"", task.invocation);
        for (name, value) in &self.forwarded_env {
            variables.push_str(&format!(",{}=\"{}\"", name, value));
        }
        builder
            .option("-N", &task.job_name)
            .option("-v", variables)
            .path(&self.qsub_script)
            .build()
    }
}

#[async_trait]
impl TaskHandler for ClusterHandler {
    async fn dispatch(&self, tasks: &[Task]) -> Result<DispatchOutcome> {
        let mut submitted = 0;
        let mut rejected = Vec::new();

        for task in tasks {
            let command = self.submit_command(task);
            debug!("Submitting: {}", command.display_line());

            match self.subprocess.run(command).await {
                Ok(output) if output.status.success() => {
                    info!("Submitted {} as {}: {}", task.name, task.job_name, output.stdout.trim());
                    submitted += 1;
                }
                Ok(output) => {
                    error!(
                        "Submission of {} rejected ({:?}): {}",
                        task.name,
                        output.status,
                        output.stderr.trim()
                    );
                    rejected.push(task.name.clone());
                }
                Err(e) => {
                    error!("Submission of {} failed: {}", task.name, e);
                    rejected.push(task.name.clone());
                }
            }
        }

        Ok(DispatchOutcome::Submitted {
            submitted,
            rejected,
        })
    }
}
