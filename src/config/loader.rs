//! External tool configuration.
//!
//! Defaults name the standard GDAL utilities; an optional TOML file and
//! `PANBATCH_*` environment variables override them, in that order.

use crate::error::{ErrorCode, PanbatchError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_QSUB_SCRIPT: &str = "qsub_pansharpen.sh";

/// Environment variables read by [`ToolConfig::merge_env_vars`]
pub const ENV_OVERRIDES: [&str; 4] = [
    "PANBATCH_ORTHO_COMMAND",
    "PANBATCH_PANSHARPEN_COMMAND",
    "PANBATCH_OVERVIEW_COMMAND",
    "PANBATCH_QSUB_SCRIPT",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub ortho_command: String,
    pub pansharpen_command: String,
    pub overview_command: String,
    pub gdalinfo_command: String,
    pub qsub_command: String,
    /// Script handed to the scheduler; resolved beside the executable when unset
    pub qsub_script: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ortho_command: "pgc_ortho.py".to_string(),
            pansharpen_command: "gdal_pansharpen.py".to_string(),
            overview_command: "gdaladdo".to_string(),
            gdalinfo_command: "gdalinfo".to_string(),
            qsub_command: "qsub".to_string(),
            qsub_script: None,
        }
    }
}

impl ToolConfig {
    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.merge_env_vars();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PanbatchError::config(
                ErrorCode::CONFIG_NOT_FOUND,
                format!("Cannot read config file {}", path.display()),
            )
            .with_source(e)
        })?;
        toml::from_str(&content).map_err(|e| {
            PanbatchError::config(
                ErrorCode::CONFIG_PARSE_ERROR,
                format!("Invalid config file {}", path.display()),
            )
            .with_source(e)
        })
    }

    pub fn merge_env_vars(&mut self) {
        if let Ok(value) = std::env::var("PANBATCH_ORTHO_COMMAND") {
            self.ortho_command = value;
        }

        if let Ok(value) = std::env::var("PANBATCH_PANSHARPEN_COMMAND") {
            self.pansharpen_command = value;
        }

        if let Ok(value) = std::env::var("PANBATCH_OVERVIEW_COMMAND") {
            self.overview_command = value;
        }

        if let Ok(value) = std::env::var("PANBATCH_QSUB_SCRIPT") {
            self.qsub_script = Some(PathBuf::from(value));
        }
    }

    /// Overrides present in this process's environment, as (name, value).
    ///
    /// Scheduler jobs do not inherit the submitting environment, so cluster
    /// submission passes these along explicitly.
    pub fn env_overrides() -> Vec<(String, String)> {
        ENV_OVERRIDES
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|value| (name.to_string(), value)))
            .collect()
    }

    /// The scheduler script path, defaulting to one shipped beside the binary
    pub fn resolved_qsub_script(&self) -> PathBuf {
        if let Some(script) = &self.qsub_script {
            return script.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_QSUB_SCRIPT)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_QSUB_SCRIPT))
    }
}
