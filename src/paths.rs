//! Deterministic output path planning.
//!
//! Every intermediate and final path of an image's pipeline is a pure
//! function of the source pair, the destination and working directories,
//! and the output options. Stage skipping relies on this: the same image and
//! configuration always name the same files.

use crate::config::OutputOptions;
use std::path::{Path, PathBuf};

/// The named file set used by one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePathSet {
    pub pan_source: PathBuf,
    pub mul_source: PathBuf,
    pub pan_working_output: PathBuf,
    pub mul_working_output: PathBuf,
    pub pan_final_output: PathBuf,
    pub mul_final_output: PathBuf,
    pub pansharp_temp_output: PathBuf,
    pub pansharp_working_output: PathBuf,
    pub pansharp_final_output: PathBuf,
    pub pansharp_metadata_sidecar: PathBuf,
    pub mul_metadata_sidecar: PathBuf,
}

impl ImagePathSet {
    /// Per-task log file, beside the final pansharpened product
    pub fn task_log(&self) -> PathBuf {
        self.pansharp_final_output.with_extension("log")
    }

    /// Scratch files removed at cleanup, in removal order
    pub fn scratch_files(&self) -> [&Path; 3] {
        [
            &self.pansharp_working_output,
            &self.pan_working_output,
            &self.mul_working_output,
        ]
    }

    /// Every file a run of this image may create, excluding the task log
    pub fn outputs(&self) -> [&Path; 8] {
        [
            &self.pan_working_output,
            &self.mul_working_output,
            &self.pan_final_output,
            &self.mul_final_output,
            &self.pansharp_temp_output,
            &self.pansharp_working_output,
            &self.pansharp_final_output,
            &self.pansharp_metadata_sidecar,
        ]
    }

    /// (working, final) pairs published when working and destination differ
    pub fn publish_pairs(&self) -> [(&Path, &Path); 3] {
        [
            (&self.pansharp_working_output, &self.pansharp_final_output),
            (&self.pan_working_output, &self.pan_final_output),
            (&self.mul_working_output, &self.mul_final_output),
        ]
    }
}

/// Strip the final extension from a path's filename
fn basename(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Final pansharpened product path for a multispectral source.
///
/// Needs no companion, so the queue builder can test for completed work
/// before resolving anything else.
pub fn pansharp_final_path(mul_source: &Path, dst_dir: &Path, options: &OutputOptions) -> PathBuf {
    dst_dir.join(format!(
        "{}_{}_pansh.tif",
        basename(mul_source),
        options.product_tag()
    ))
}

/// Plan every path of the pipeline for one image pair.
///
/// The working directory defaults to `dst_dir` when `options.working_dir` is
/// unset. No filesystem access happens here.
pub fn plan(
    mul_source: &Path,
    pan_source: &Path,
    dst_dir: &Path,
    options: &OutputOptions,
) -> ImagePathSet {
    let working_dir = options.working_dir.as_deref().unwrap_or(dst_dir);
    let tag = options.product_tag();
    let mul_base = format!("{}_{}", basename(mul_source), tag);
    let pan_base = format!("{}_{}", basename(pan_source), tag);

    ImagePathSet {
        pan_source: pan_source.to_path_buf(),
        mul_source: mul_source.to_path_buf(),
        pan_working_output: working_dir.join(format!("{pan_base}.tif")),
        mul_working_output: working_dir.join(format!("{mul_base}.tif")),
        pan_final_output: dst_dir.join(format!("{pan_base}.tif")),
        mul_final_output: dst_dir.join(format!("{mul_base}.tif")),
        pansharp_temp_output: working_dir.join(format!("{mul_base}_pansh_temp.tif")),
        pansharp_working_output: working_dir.join(format!("{mul_base}_pansh.tif")),
        pansharp_final_output: pansharp_final_path(mul_source, dst_dir, options),
        pansharp_metadata_sidecar: dst_dir.join(format!("{mul_base}_pansh.xml")),
        mul_metadata_sidecar: dst_dir.join(format!("{mul_base}.xml")),
    }
}
