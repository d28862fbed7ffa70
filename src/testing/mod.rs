//! Testing utilities and fixtures
//!
//! [`FakeToolchain`] stands in for the ortho processor and the GDAL tools:
//! it writes placeholder rasters where the real tools would, records every
//! call, and can be told to fail. Fixture helpers lay out source image pairs
//! named the way the sensors name them.

use crate::config::{BitDepth, OutputOptions, Stretch};
use crate::pipeline::PipelineExecutor;
use crate::tools::{OrthoParams, OrthoProcessor, RasterTools, ToolOutcome};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Ortho {
        src: PathBuf,
        dst: PathBuf,
        resolution: Option<f64>,
    },
    Pansharpen {
        pan: PathBuf,
        mul: PathBuf,
        out: PathBuf,
    },
    Overviews {
        raster: PathBuf,
        levels: Vec<u32>,
    },
}

/// In-process replacement for the external raster tools
#[derive(Default)]
pub struct FakeToolchain {
    calls: Mutex<Vec<ToolCall>>,
    /// Ortho fails for sources whose filename contains one of these
    failing_ortho: Vec<String>,
    /// Ortho writes a partial raster and dies for these
    crashing_ortho: Vec<String>,
    fail_pansharpen: bool,
    kill_pansharpen: bool,
    fail_overviews: bool,
    skip_metadata: bool,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_ortho_for(mut self, name_fragment: impl Into<String>) -> Self {
        self.failing_ortho.push(name_fragment.into());
        self
    }

    /// Ortho leaves a truncated raster behind and reports SIGKILL
    pub fn truncate_ortho_for(mut self, name_fragment: impl Into<String>) -> Self {
        self.crashing_ortho.push(name_fragment.into());
        self
    }

    pub fn fail_pansharpen(mut self) -> Self {
        self.fail_pansharpen = true;
        self
    }

    /// Report pansharpening as killed by SIGKILL
    pub fn kill_pansharpen(mut self) -> Self {
        self.kill_pansharpen = true;
        self
    }

    pub fn fail_overviews(mut self) -> Self {
        self.fail_overviews = true;
        self
    }

    /// Do not write the XML sidecar beside ortho outputs
    pub fn without_metadata(mut self) -> Self {
        self.skip_metadata = true;
        self
    }

    /// Hold every ortho call for `delay`, so concurrent runs overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Executor wired to this toolchain for both capabilities
    pub fn executor(self: &Arc<Self>) -> PipelineExecutor {
        PipelineExecutor::new(self.clone(), self.clone())
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn ortho_calls(&self) -> Vec<ToolCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, ToolCall::Ortho { .. }))
            .collect()
    }

    pub fn pansharpen_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ToolCall::Pansharpen { .. }))
            .count()
    }

    /// Highest number of ortho calls observed running at once
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: ToolCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

async fn write_placeholder(path: &Path, content: &[u8]) -> ToolOutcome {
    match tokio::fs::write(path, content).await {
        Ok(()) => ToolOutcome::success(),
        Err(e) => ToolOutcome::failure(1, format!("cannot write {}: {}", path.display(), e)),
    }
}

#[async_trait]
impl OrthoProcessor for FakeToolchain {
    async fn process(&self, src: &Path, dst: &Path, params: &OrthoParams) -> ToolOutcome {
        self.record(ToolCall::Ortho {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            resolution: params.resolution,
        });

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let name = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.failing_ortho.iter().any(|f| name.contains(f.as_str())) {
            return ToolOutcome::failure(1, format!("ERROR: cannot orthorectify {name}"));
        }
        if self.crashing_ortho.iter().any(|f| name.contains(f.as_str())) {
            let _ = tokio::fs::write(dst, b"trunc").await;
            let _ = tokio::fs::write(dst.with_extension("xml"), b"<isd").await;
            return ToolOutcome::failure(137, "");
        }

        let outcome = write_placeholder(dst, b"ortho").await;
        if outcome.is_success() && !self.skip_metadata {
            return write_placeholder(&dst.with_extension("xml"), b"<isd/>").await;
        }
        outcome
    }
}

#[async_trait]
impl RasterTools for FakeToolchain {
    async fn pansharpen(&self, pan: &Path, mul: &Path, out: &Path) -> ToolOutcome {
        self.record(ToolCall::Pansharpen {
            pan: pan.to_path_buf(),
            mul: mul.to_path_buf(),
            out: out.to_path_buf(),
        });
        if self.fail_pansharpen {
            // The real tool can leave a partial raster behind
            let _ = tokio::fs::write(out, b"partial").await;
            return ToolOutcome::failure(1, "ERROR 1: pansharpening failed");
        }
        if self.kill_pansharpen {
            let _ = tokio::fs::write(out, b"partial").await;
            return ToolOutcome::failure(137, "");
        }
        write_placeholder(out, b"pansharpened").await
    }

    async fn build_overviews(&self, raster: &Path, levels: &[u32]) -> ToolOutcome {
        self.record(ToolCall::Overviews {
            raster: raster.to_path_buf(),
            levels: levels.to_vec(),
        });
        if self.fail_overviews {
            return ToolOutcome::failure(1, "ERROR 1: cannot build overviews");
        }
        ToolOutcome::success()
    }
}

/// Options used throughout the test suite: Byte, reflectance, EPSG:3413
pub fn default_options() -> OutputOptions {
    OutputOptions::new(BitDepth::Byte, Stretch::Rf, 3413)
}

/// Multispectral and panchromatic filenames for the `index`th WV02 scene
pub fn wv02_names(index: usize) -> (String, String) {
    let stem = format!("WV02_12FEB06{:06}", 131504 + index);
    (
        format!("{stem}-M1BS-10300100106FC100.ntf"),
        format!("{stem}-P1BS-10300100106FC100.ntf"),
    )
}

/// Write the `index`th WV02 pair into `dir`, returning (mul, pan)
pub fn write_wv02_pair(dir: &Path, index: usize) -> std::io::Result<(PathBuf, PathBuf)> {
    let (mul_name, pan_name) = wv02_names(index);
    let mul = dir.join(mul_name);
    let pan = dir.join(pan_name);
    std::fs::create_dir_all(dir)?;
    std::fs::write(&mul, b"mul")?;
    std::fs::write(&pan, b"pan")?;
    Ok((mul, pan))
}
