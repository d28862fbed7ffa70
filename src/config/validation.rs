use super::DispatchMode;
use crate::error::{ErrorCode, PanbatchError, Result};
use std::path::{Path, PathBuf};

pub fn validate_destination(dst: &Path) -> Result<()> {
    if !dst.is_dir() {
        return Err(PanbatchError::config(
            ErrorCode::CONFIG_INVALID_DESTINATION,
            format!("Destination is not a valid directory: {}", dst.display()),
        ));
    }
    Ok(())
}

/// Reject EPSG codes that cannot name a projection; full CRS validation
/// belongs to the ortho processor.
pub fn validate_epsg(epsg: u32) -> Result<()> {
    if epsg == 0 {
        return Err(PanbatchError::config(
            ErrorCode::CONFIG_INVALID_VALUE,
            "EPSG code must be a positive integer",
        ));
    }
    Ok(())
}

/// Select the backend from the raw dispatch flags.
///
/// Cluster submission and a local pool larger than one worker are mutually
/// exclusive; in cluster mode the scheduler script must exist.
pub fn resolve_dispatch_mode(
    pbs: bool,
    parallel_processes: usize,
    resources: Option<String>,
    qsub_script: PathBuf,
) -> Result<DispatchMode> {
    if parallel_processes == 0 {
        return Err(PanbatchError::config(
            ErrorCode::CONFIG_INVALID_VALUE,
            "--parallel-processes must be at least 1",
        ));
    }

    if pbs && parallel_processes > 1 {
        return Err(PanbatchError::config(
            ErrorCode::CONFIG_CONFLICTING_OPTIONS,
            "Options --pbs and --parallel-processes > 1 are mutually exclusive",
        ));
    }

    if pbs {
        if !qsub_script.is_file() {
            return Err(PanbatchError::config(
                ErrorCode::CONFIG_NOT_FOUND,
                format!("qsub script path is not valid: {}", qsub_script.display()),
            ));
        }
        return Ok(DispatchMode::Cluster {
            resources,
            qsub_script,
        });
    }

    if parallel_processes > 1 {
        Ok(DispatchMode::LocalParallel {
            workers: parallel_processes,
        })
    } else {
        Ok(DispatchMode::Serial)
    }
}
