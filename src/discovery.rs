//! Batch source handling.
//!
//! A batch source is a directory (searched recursively), a `.txt` manifest
//! listing one image path per line, or a single image.

use crate::error::{ErrorCode, PanbatchError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Image extensions accepted as pipeline input, compared case-insensitively
pub const IMAGE_EXTENSIONS: [&str; 2] = ["ntf", "tif"];

const MANIFEST_EXTENSION: &str = "txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Directory(PathBuf),
    Manifest(PathBuf),
    Image(PathBuf),
}

pub fn has_image_extension(path: &Path) -> bool {
    has_extension(path, &IMAGE_EXTENSIONS)
}

fn has_extension(path: &Path, accepted: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| accepted.iter().any(|a| ext.eq_ignore_ascii_case(a)))
}

impl SourceSpec {
    /// Classify a source path, failing with a configuration error when it is
    /// none of the accepted kinds
    pub fn classify(path: &Path) -> Result<Self> {
        if path.is_dir() {
            Ok(SourceSpec::Directory(path.to_path_buf()))
        } else if path.is_file() && has_extension(path, &[MANIFEST_EXTENSION]) {
            Ok(SourceSpec::Manifest(path.to_path_buf()))
        } else if path.is_file() && has_image_extension(path) {
            Ok(SourceSpec::Image(path.to_path_buf()))
        } else {
            Err(PanbatchError::config(
                ErrorCode::CONFIG_INVALID_SOURCE,
                format!(
                    "Source is not a recognized file path or file type: {}",
                    path.display()
                ),
            ))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SourceSpec::Directory(p) | SourceSpec::Manifest(p) | SourceSpec::Image(p) => p,
        }
    }

    /// Expand into candidate image paths, in a stable order
    pub fn expand(&self) -> Result<Vec<PathBuf>> {
        match self {
            SourceSpec::Directory(dir) => {
                let images: Vec<PathBuf> = WalkDir::new(dir)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
                    .filter(|path| has_image_extension(path))
                    .collect();
                debug!("Found {} images under {}", images.len(), dir.display());
                Ok(images)
            }
            SourceSpec::Manifest(manifest) => {
                let content = std::fs::read_to_string(manifest).map_err(|e| {
                    PanbatchError::config(
                        ErrorCode::CONFIG_INVALID_SOURCE,
                        format!("Cannot read manifest {}", manifest.display()),
                    )
                    .with_source(e)
                })?;
                let mut images = Vec::new();
                for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    let path = PathBuf::from(line);
                    if path.is_file() && has_image_extension(&path) {
                        images.push(path);
                    } else {
                        debug!(
                            "Manifest entry does not exist or has an invalid extension: {}",
                            line
                        );
                    }
                }
                Ok(images)
            }
            SourceSpec::Image(image) => Ok(vec![image.clone()]),
        }
    }
}
