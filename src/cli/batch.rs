//! The batch command: validate, build the queue, dispatch, summarize.

use super::args::Cli;
use crate::config::{self, DispatchMode, ToolConfig};
use crate::discovery::SourceSpec;
use crate::dispatch::{
    render_plan, ClusterHandler, DispatchOutcome, ParallelHandler, SerialHandler, TaskHandler,
};
use crate::error::{ErrorCode, PanbatchError};
use crate::pipeline::PipelineExecutor;
use crate::queue::{QueueSummary, TaskQueueBuilder};
use crate::subprocess::SubprocessManager;
use crate::tools::{check_gdal_version, CommandOrthoProcessor, GdalRasterTools};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const PROGRAM_NAME: &str = "panbatch";

/// Resolve `path` against the current directory without touching the filesystem
fn absolute(path: &Path) -> crate::error::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| {
        PanbatchError::config(
            ErrorCode::CONFIG_GENERIC,
            "Cannot determine the current directory",
        )
        .with_source(e)
    })?;
    Ok(cwd.join(path))
}

/// Program path embedded in cluster job invocations
fn program_path() -> String {
    std::env::current_exe()
        .map(|exe| exe.to_string_lossy().into_owned())
        .unwrap_or_else(|_| PROGRAM_NAME.to_string())
}

fn log_queue_summary(summary: &QueueSummary, queued: usize) {
    info!(
        "Images found: {}, queued: {}, already complete: {}, excluded: {}",
        summary.candidates - summary.unrecognized,
        queued,
        summary.already_complete,
        summary.excluded
    );
}

/// Run a batch with the given arguments, returning the process exit code:
/// 0 when every task succeeded or was submitted, 1 otherwise.
///
/// Configuration problems are returned as errors before any task starts.
pub async fn run(cli: Cli) -> Result<i32> {
    run_with(cli, SubprocessManager::production()).await
}

/// [`run`] with an injected subprocess layer
pub async fn run_with(mut cli: Cli, subprocess: SubprocessManager) -> Result<i32> {
    let tools = ToolConfig::load(cli.config.as_deref())?;

    cli.src = absolute(&cli.src)?;
    cli.dst = absolute(&cli.dst)?;
    if let Some(working_dir) = cli.working_dir.take() {
        cli.working_dir = Some(absolute(&working_dir)?);
    }

    let source = SourceSpec::classify(&cli.src)?;
    config::validate_destination(&cli.dst)?;
    config::validate_epsg(cli.epsg)?;
    let qsub_script = match &cli.qsub_script {
        Some(script) => absolute(script)?,
        None => tools.resolved_qsub_script(),
    };
    let mode = config::resolve_dispatch_mode(
        cli.pbs,
        cli.parallel_processes,
        cli.resources.clone(),
        qsub_script,
    )?;
    debug!("Dispatch mode: {:?}", mode);

    if !cli.dry_run {
        let version = check_gdal_version(&subprocess, &tools.gdalinfo_command).await?;
        info!("Using GDAL {}", version);
    }

    let queue = TaskQueueBuilder::new(&cli.dst, cli.output_options())
        .with_base_args(cli.single_image_args(&program_path()))
        .build(&source)?;
    log_queue_summary(&queue.summary, queue.len());

    if queue.is_empty() {
        info!("No images found to process");
        return Ok(0);
    }

    let cluster = match &mode {
        DispatchMode::Cluster {
            resources,
            qsub_script,
        } => Some(ClusterHandler::new(
            tools.qsub_command.clone(),
            qsub_script.clone(),
            resources.clone(),
            subprocess.clone(),
        )
        .with_env(ToolConfig::env_overrides())),
        _ => None,
    };

    if cli.dry_run {
        println!("DRY RUN - {} task(s) would be processed", queue.len());
        print!("{}", render_plan(&queue.tasks, cluster.as_ref()));
        return Ok(0);
    }

    let handler: Box<dyn TaskHandler> = match (mode, cluster) {
        (_, Some(cluster)) => Box::new(cluster),
        (DispatchMode::LocalParallel { workers }, None) => {
            Box::new(ParallelHandler::new(executor(&tools, &subprocess), workers))
        }
        _ => Box::new(SerialHandler::new(executor(&tools, &subprocess))),
    };

    match handler.dispatch(&queue.tasks).await? {
        DispatchOutcome::Completed(report) => {
            let failed = report.failed();
            info!(
                "Tasks completed: {}, failed: {}",
                report.len() - failed.len(),
                failed.len()
            );
            if failed.is_empty() {
                Ok(0)
            } else {
                eprintln!("{} image(s) failed:", failed.len());
                for name in failed {
                    eprintln!("  {}", name);
                }
                Ok(1)
            }
        }
        DispatchOutcome::Submitted {
            submitted,
            rejected,
        } => {
            info!("Submitted {} job(s) to the scheduler", submitted);
            warn!("Cluster jobs run detached; check each image's log file for its result");
            if rejected.is_empty() {
                Ok(0)
            } else {
                eprintln!("{} submission(s) rejected:", rejected.len());
                for name in &rejected {
                    eprintln!("  {}", name);
                }
                Ok(1)
            }
        }
    }
}

fn executor(tools: &ToolConfig, subprocess: &SubprocessManager) -> PipelineExecutor {
    PipelineExecutor::new(
        Arc::new(CommandOrthoProcessor::new(
            tools.ortho_command.clone(),
            subprocess.clone(),
        )),
        Arc::new(GdalRasterTools::new(tools, subprocess.clone())),
    )
}

/// Exit code for an error that escaped [`run`]
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<PanbatchError>()
        .map(PanbatchError::exit_code)
        .unwrap_or(1)
}
