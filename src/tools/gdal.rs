use super::{RasterTools, ToolOutcome};
use crate::config::ToolConfig;
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder, SubprocessManager};
use async_trait::async_trait;
use std::path::Path;

/// Creation options for pansharpened output: tiled, LZW-compressed, BigTIFF when needed
pub const PANSHARPEN_CREATION_OPTIONS: [&str; 3] =
    ["BIGTIFF=IF_SAFER", "COMPRESS=LZW", "TILED=YES"];

/// Pansharpening and overview building through the GDAL command line utilities
pub struct GdalRasterTools {
    pansharpen_program: String,
    overview_program: String,
    subprocess: SubprocessManager,
}

impl GdalRasterTools {
    pub fn new(config: &ToolConfig, subprocess: SubprocessManager) -> Self {
        Self {
            pansharpen_program: config.pansharpen_command.clone(),
            overview_program: config.overview_command.clone(),
            subprocess,
        }
    }

    pub fn pansharpen_command(&self, pan: &Path, mul: &Path, out: &Path) -> ProcessCommand {
        PANSHARPEN_CREATION_OPTIONS
            .iter()
            .fold(
                ProcessCommandBuilder::new(self.pansharpen_program.as_str()),
                |builder, option| builder.option("-co", option),
            )
            .path(pan)
            .path(mul)
            .path(out)
            .build()
    }

    pub fn overview_command(&self, raster: &Path, levels: &[u32]) -> ProcessCommand {
        levels
            .iter()
            .fold(
                ProcessCommandBuilder::new(self.overview_program.as_str()).path(raster),
                |builder, level| builder.arg(level.to_string()),
            )
            .build()
    }
}

#[async_trait]
impl RasterTools for GdalRasterTools {
    async fn pansharpen(&self, pan: &Path, mul: &Path, out: &Path) -> ToolOutcome {
        let command = self.pansharpen_command(pan, mul, out);
        ToolOutcome::from_process(self.subprocess.run(command).await)
    }

    async fn build_overviews(&self, raster: &Path, levels: &[u32]) -> ToolOutcome {
        let command = self.overview_command(raster, levels);
        ToolOutcome::from_process(self.subprocess.run(command).await)
    }
}
