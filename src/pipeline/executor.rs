use super::log::TaskLog;
use super::stage::{PipelineReport, Stage, StageResult};
use crate::queue::PipelineRequest;
use crate::tools::{OrthoParams, OrthoProcessor, RasterTools, OVERVIEW_LEVELS};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Multispectral ground sampling distance relative to panchromatic
pub const MUL_RESOLUTION_FACTOR: f64 = 4.0;

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Copy through a sibling `.partial` file so an interrupted copy never
/// leaves a truncated file under the final name
async fn copy_atomic(src: &Path, dst: &Path) -> std::io::Result<()> {
    let mut partial = dst.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    if let Err(e) = tokio::fs::copy(src, &partial).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }
    tokio::fs::rename(&partial, dst).await
}

/// Whether two directories are one once `..` and symlinks are resolved
async fn same_directory(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Drives one image through ortho, pansharpen, overviews, publish and cleanup.
///
/// Each stage is skipped when its outputs already exist, and a failed stage
/// does not stop the run: later stages find their inputs missing and no-op.
/// Rerunning a batch therefore resumes wherever the previous run stopped.
#[derive(Clone)]
pub struct PipelineExecutor {
    ortho: Arc<dyn OrthoProcessor>,
    tools: Arc<dyn RasterTools>,
}

impl PipelineExecutor {
    pub fn new(ortho: Arc<dyn OrthoProcessor>, tools: Arc<dyn RasterTools>) -> Self {
        Self { ortho, tools }
    }

    pub async fn run(&self, request: &PipelineRequest, log: &TaskLog) -> PipelineReport {
        let mut report = PipelineReport::default();
        let paths = &request.paths;
        let working_dir = request
            .options
            .working_dir
            .as_deref()
            .unwrap_or(request.dst_dir.as_path());

        log.info(format!("Working Dir: {}", working_dir.display()));
        log.info(format!("Multispectral image: {}", paths.mul_source.display()));
        log.info(format!("Panchromatic image: {}", paths.pan_source.display()));

        if let Err(e) = tokio::fs::create_dir_all(working_dir).await {
            log.error(format!(
                "Cannot create working directory {}: {}",
                working_dir.display(),
                e
            ));
        }

        let params = OrthoParams::from_options(&request.options);

        log.info("Orthorectifying panchromatic image");
        let result = self
            .ortho_stage(
                &paths.pan_source,
                &paths.pan_final_output,
                &paths.pan_working_output,
                &params,
                log,
            )
            .await;
        report.record(Stage::OrthoPan, result);

        let result = self
            .promote(&paths.pan_final_output, &paths.pan_working_output, log)
            .await;
        report.record(Stage::PromotePan, result);

        log.info("Orthorectifying multispectral image");
        // A requested resolution targets the pansharpened product
        let mul_params = params
            .clone()
            .with_resolution(params.resolution.map(|r| r * MUL_RESOLUTION_FACTOR));
        let result = self
            .ortho_stage(
                &paths.mul_source,
                &paths.mul_final_output,
                &paths.mul_working_output,
                &mul_params,
                log,
            )
            .await;
        report.record(Stage::OrthoMul, result);

        let result = self
            .promote(&paths.mul_final_output, &paths.mul_working_output, log)
            .await;
        report.record(Stage::PromoteMul, result);

        log.info("Pansharpening multispectral image");
        report.record(Stage::Pansharpen, self.pansharpen(request, log).await);

        report.record(Stage::BuildOverviews, self.build_overviews(request, log).await);
        report.record(Stage::PublishMetadata, self.publish_metadata(request, log).await);

        // Working files are the final products when the directories coincide
        let same_dir = same_directory(working_dir, &request.dst_dir).await;
        let result = if same_dir {
            StageResult::Skipped
        } else {
            self.publish_outputs(request, log).await
        };
        report.record(Stage::PublishOutputs, result);

        let result = if request.options.save_temps || same_dir {
            StageResult::Skipped
        } else {
            self.cleanup(request, log).await
        };
        report.record(Stage::Cleanup, result);

        report.finish(is_file(&paths.pansharp_final_output).await);
        if report.status() != 0 {
            log.error(format!(
                "Pipeline incomplete for {}: {}",
                file_name(&paths.mul_source),
                report.failure_summary()
            ));
        }
        report
    }

    async fn ortho_stage(
        &self,
        src: &Path,
        final_output: &Path,
        working_output: &Path,
        params: &OrthoParams,
        log: &TaskLog,
    ) -> StageResult {
        if is_file(final_output).await || is_file(working_output).await {
            log.debug(format!("Ortho output exists: {}", file_name(final_output)));
            return StageResult::Skipped;
        }

        let outcome = self.ortho.process(src, final_output, params).await;
        if outcome.is_success() {
            StageResult::Completed
        } else {
            // A partial raster must not pass for finished work on rerun
            let _ = tokio::fs::remove_file(final_output).await;
            let _ = tokio::fs::remove_file(final_output.with_extension("xml")).await;
            let message = format!(
                "Ortho of {} failed with status {}: {}",
                file_name(src),
                outcome.status,
                outcome.diagnostics
            );
            log.error(&message);
            StageResult::Failed(message)
        }
    }

    /// Copy a final ortho output into the working directory
    async fn promote(&self, final_output: &Path, working_output: &Path, log: &TaskLog) -> StageResult {
        if is_file(working_output).await || !is_file(final_output).await {
            return StageResult::Skipped;
        }

        match tokio::fs::copy(final_output, working_output).await {
            Ok(_) => StageResult::Completed,
            Err(e) => {
                let message = format!(
                    "Could not copy {} to working directory: {}",
                    file_name(final_output),
                    e
                );
                log.warn(&message);
                StageResult::Warning(message)
            }
        }
    }

    async fn pansharpen(&self, request: &PipelineRequest, log: &TaskLog) -> StageResult {
        let paths = &request.paths;
        if is_file(&paths.pansharp_working_output).await {
            return StageResult::Skipped;
        }

        if !(is_file(&paths.pan_working_output).await && is_file(&paths.mul_working_output).await) {
            log.error(format!(
                "Pan or Multi warped image does not exist\n\t{}\n\t{}",
                paths.pan_working_output.display(),
                paths.mul_working_output.display()
            ));
            return StageResult::Skipped;
        }

        // Leftover from an interrupted run
        if is_file(&paths.pansharp_temp_output).await {
            let _ = tokio::fs::remove_file(&paths.pansharp_temp_output).await;
        }

        let outcome = self
            .tools
            .pansharpen(
                &paths.pan_working_output,
                &paths.mul_working_output,
                &paths.pansharp_temp_output,
            )
            .await;

        if !outcome.is_success() {
            let _ = tokio::fs::remove_file(&paths.pansharp_temp_output).await;
            let message = format!(
                "Pansharpening failed with status {}: {}",
                outcome.status, outcome.diagnostics
            );
            log.error(&message);
            return StageResult::Failed(message);
        }

        match tokio::fs::rename(&paths.pansharp_temp_output, &paths.pansharp_working_output).await {
            Ok(()) => StageResult::Completed,
            Err(e) => {
                let message = format!(
                    "Could not move pansharpened output into place {}: {}",
                    paths.pansharp_working_output.display(),
                    e
                );
                log.error(&message);
                StageResult::Failed(message)
            }
        }
    }

    async fn build_overviews(&self, request: &PipelineRequest, log: &TaskLog) -> StageResult {
        let raster = &request.paths.pansharp_working_output;
        if !is_file(raster).await {
            return StageResult::Skipped;
        }

        let outcome = self.tools.build_overviews(raster, &OVERVIEW_LEVELS).await;
        if outcome.is_success() {
            StageResult::Completed
        } else {
            let message = format!(
                "Building overviews for {} failed with status {}: {}",
                file_name(raster),
                outcome.status,
                outcome.diagnostics
            );
            log.warn(&message);
            StageResult::Warning(message)
        }
    }

    async fn publish_metadata(&self, request: &PipelineRequest, log: &TaskLog) -> StageResult {
        let paths = &request.paths;
        match tokio::fs::copy(&paths.mul_metadata_sidecar, &paths.pansharp_metadata_sidecar).await {
            Ok(_) => StageResult::Completed,
            Err(e) => {
                let message = format!(
                    "Could not copy metadata {} to {}: {}",
                    file_name(&paths.mul_metadata_sidecar),
                    file_name(&paths.pansharp_metadata_sidecar),
                    e
                );
                log.warn(&message);
                StageResult::Warning(message)
            }
        }
    }

    async fn publish_outputs(&self, request: &PipelineRequest, log: &TaskLog) -> StageResult {
        let mut warnings = Vec::new();
        for (working, final_output) in request.paths.publish_pairs() {
            if !is_file(working).await || is_file(final_output).await {
                continue;
            }
            if let Err(e) = copy_atomic(working, final_output).await {
                let message = format!("Could not publish {}: {}", file_name(final_output), e);
                log.warn(&message);
                warnings.push(message);
            }
        }
        StageResult::from_warnings(warnings)
    }

    async fn cleanup(&self, request: &PipelineRequest, log: &TaskLog) -> StageResult {
        let mut warnings = Vec::new();
        for scratch in request.paths.scratch_files() {
            if !is_file(scratch).await {
                continue;
            }
            if let Err(e) = tokio::fs::remove_file(scratch).await {
                let message = format!("Could not remove {}: {}", file_name(scratch), e);
                log.warn(&message);
                warnings.push(message);
            }
        }
        StageResult::from_warnings(warnings)
    }
}
