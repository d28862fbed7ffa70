use crate::error::{ErrorCode, PanbatchError, Result};
use crate::subprocess::{ProcessCommandBuilder, SubprocessManager};
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use tracing::debug;

/// Oldest GDAL release whose `gdal_pansharpen.py` is usable
pub const MIN_GDAL_VERSION: Version = Version::new(2, 1, 0);

static GDAL_VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"GDAL (\d+)\.(\d+)\.(\d+)").expect("Invalid regex pattern"));

/// Parse the version out of `gdalinfo --version` output
pub fn parse_gdal_version(output: &str) -> Option<Version> {
    let caps = GDAL_VERSION_PATTERN.captures(output)?;
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}

/// Verify the installed GDAL supports pansharpening
pub async fn check_gdal_version(subprocess: &SubprocessManager, gdalinfo: &str) -> Result<Version> {
    let command = ProcessCommandBuilder::new(gdalinfo).arg("--version").build();
    let output = subprocess.run(command).await.map_err(|e| {
        PanbatchError::config(
            ErrorCode::CONFIG_INCOMPATIBLE_VERSION,
            format!("Cannot determine GDAL version using '{}'", gdalinfo),
        )
        .with_source(e)
    })?;

    let version = parse_gdal_version(&output.stdout).ok_or_else(|| {
        PanbatchError::config(
            ErrorCode::CONFIG_INCOMPATIBLE_VERSION,
            format!("Cannot parse GDAL version: {}", output.stdout.trim()),
        )
    })?;
    debug!("Detected GDAL {}", version);

    if version < MIN_GDAL_VERSION {
        return Err(PanbatchError::config(
            ErrorCode::CONFIG_INCOMPATIBLE_VERSION,
            format!(
                "gdal_pansharpen requires GDAL version {} or higher, found {}",
                MIN_GDAL_VERSION, version
            ),
        ));
    }
    Ok(version)
}
