//! External raster tools, modeled as synchronous capabilities.
//!
//! The pipeline only sees [`OrthoProcessor`] and [`RasterTools`]; each call
//! blocks until the tool finishes and reports a [`ToolOutcome`]. Production
//! implementations shell out through the subprocess layer, tests use fakes.

pub mod gdal;
pub mod ortho;
pub mod preflight;

pub use gdal::GdalRasterTools;
pub use ortho::CommandOrthoProcessor;
pub use preflight::{check_gdal_version, MIN_GDAL_VERSION};

use crate::config::{BitDepth, OutputOptions, Stretch};
use crate::subprocess::{ProcessError, ProcessOutput};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Overview decimation levels built on every pansharpened product
pub const OVERVIEW_LEVELS: [u32; 4] = [2, 4, 8, 16];

/// Status code and diagnostic text reported by an external tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub status: i32,
    pub diagnostics: String,
}

impl ToolOutcome {
    pub fn success() -> Self {
        Self {
            status: 0,
            diagnostics: String::new(),
        }
    }

    pub fn failure(status: i32, diagnostics: impl Into<String>) -> Self {
        Self {
            status,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    /// Fold a subprocess result into a status code.
    ///
    /// Follows shell conventions: 127 for a missing command, 128+N for death
    /// by signal N.
    pub fn from_process(result: Result<ProcessOutput, ProcessError>) -> Self {
        match result {
            Ok(output) => {
                let status = output.status.shell_code();
                let diagnostics = if output.stderr.trim().is_empty() {
                    output.stdout
                } else {
                    output.stderr
                };
                Self {
                    status,
                    diagnostics: diagnostics.trim().to_string(),
                }
            }
            Err(ProcessError::CommandNotFound(program)) => {
                Self::failure(127, format!("command not found: {}", program))
            }
            Err(e) => Self::failure(1, e.to_string()),
        }
    }
}

/// Parameters handed to the ortho processor for one image
#[derive(Debug, Clone, PartialEq)]
pub struct OrthoParams {
    pub epsg: u32,
    pub bit_depth: BitDepth,
    pub stretch: Stretch,
    pub dem: Option<PathBuf>,
    pub resolution: Option<f64>,
}

impl OrthoParams {
    pub fn from_options(options: &OutputOptions) -> Self {
        Self {
            epsg: options.epsg,
            bit_depth: options.bit_depth,
            stretch: options.stretch,
            dem: options.dem.clone(),
            resolution: options.resolution,
        }
    }

    pub fn with_resolution(mut self, resolution: Option<f64>) -> Self {
        self.resolution = resolution;
        self
    }
}

#[async_trait]
pub trait OrthoProcessor: Send + Sync {
    /// Orthorectify `src` into `dst`
    async fn process(&self, src: &Path, dst: &Path, params: &OrthoParams) -> ToolOutcome;
}

#[async_trait]
pub trait RasterTools: Send + Sync {
    /// Fuse `pan` and `mul` into a pansharpened raster at `out`
    async fn pansharpen(&self, pan: &Path, mul: &Path, out: &Path) -> ToolOutcome;

    /// Build internal overviews for `raster` at the given decimation levels
    async fn build_overviews(&self, raster: &Path, levels: &[u32]) -> ToolOutcome;
}
