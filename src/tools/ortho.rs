use super::{OrthoParams, OrthoProcessor, ToolOutcome};
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder, SubprocessManager};
use async_trait::async_trait;
use std::path::Path;

/// Ortho processor backed by an external command.
///
/// Invoked as `<program> -p EPSG -t OUTTYPE -c STRETCH [-d DEM] [-r RES] SRC DST`.
pub struct CommandOrthoProcessor {
    program: String,
    subprocess: SubprocessManager,
}

impl CommandOrthoProcessor {
    pub fn new(program: impl Into<String>, subprocess: SubprocessManager) -> Self {
        Self {
            program: program.into(),
            subprocess,
        }
    }

    pub fn command(&self, src: &Path, dst: &Path, params: &OrthoParams) -> ProcessCommand {
        let mut builder = ProcessCommandBuilder::new(self.program.as_str())
            .option("-p", params.epsg)
            .option("-t", params.bit_depth.gdal_name())
            .option("-c", params.stretch.tag());
        if let Some(dem) = &params.dem {
            builder = builder.arg("-d").path(dem);
        }
        if let Some(resolution) = params.resolution {
            builder = builder.option("-r", resolution);
        }
        builder.path(src).path(dst).build()
    }
}

#[async_trait]
impl OrthoProcessor for CommandOrthoProcessor {
    async fn process(&self, src: &Path, dst: &Path, params: &OrthoParams) -> ToolOutcome {
        let command = self.command(src, dst, params);
        ToolOutcome::from_process(self.subprocess.run(command).await)
    }
}
