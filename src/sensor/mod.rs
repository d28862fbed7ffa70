//! Sensor identification and panchromatic companion resolution.
//!
//! A multispectral filename is matched against [`SENSOR_PATTERNS`] in order;
//! the first matching pattern names the sensor. The sensor then selects the
//! rule used by [`derive_pan_name`] to find the panchromatic companion.

mod companion;

pub use companion::{derive_pan_name, GE01_ALT_MARKER, GE01_ALT_SUFFIX_LEN, IK01_BAND_MARKERS};

use crate::error::{ErrorCode, PanbatchError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    WV02,
    WV03,
    QB02,
    GE01,
    IK01,
}

impl Sensor {
    pub fn as_str(self) -> &'static str {
        match self {
            Sensor::WV02 => "WV02",
            Sensor::WV03 => "WV03",
            Sensor::QB02 => "QB02",
            Sensor::GE01 => "GE01",
            Sensor::IK01 => "IK01",
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multispectral filename patterns, evaluated in this order; first match wins.
///
/// Patterns are anchored at the start of the filename.
pub static SENSOR_PATTERNS: Lazy<Vec<(Regex, Sensor)>> = Lazy::new(|| {
    [
        // WV02_12FEB061315046-M1BS-10300100106FC100.ntf
        (r"^WV02_\w+-M", Sensor::WV02),
        // GE01_12FEB061315046-M1BS-10300100106FC100.ntf
        (r"^GE01_\w+-M", Sensor::GE01),
        (r"^WV03_\w+-M", Sensor::WV03),
        (r"^QB02_\w+-M", Sensor::QB02),
        // GE01_111211M0011184144A222000100082M_000754776.ntf
        (r"^GE01_\w+M0", Sensor::GE01),
        // IK01_2009121113234710000011610960_msi_6516S.ntf
        (r"^IK01_\w+(blu|msi|bgrn)", Sensor::IK01),
    ]
    .into_iter()
    .map(|(pattern, sensor)| (Regex::new(pattern).expect("Invalid regex pattern"), sensor))
    .collect()
});

/// Identify the sensor of a multispectral image from its filename
pub fn resolve(filename: &str) -> Option<Sensor> {
    SENSOR_PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(filename))
        .map(|(_, sensor)| *sensor)
}

/// Why an image was excluded from the queue. Never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("image name does not match any known sensor: {0}")]
    UnknownSensor(PathBuf),

    #[error("no panchromatic image name could be derived for {0}")]
    NoCompanion(PathBuf),

    #[error("{count} panchromatic images match the multispectral image name {image}")]
    AmbiguousCompanion { image: PathBuf, count: usize },

    #[error("corresponding panchromatic image not found: {companion} (for {image})")]
    CompanionMissing { image: PathBuf, companion: PathBuf },

    /// Another queued image already plans the same output files
    #[error("panchromatic image {companion} is already paired with {claimed_by}")]
    CompanionShared {
        image: PathBuf,
        companion: PathBuf,
        claimed_by: PathBuf,
    },
}

impl ResolutionError {
    pub fn image(&self) -> &PathBuf {
        match self {
            ResolutionError::UnknownSensor(image) | ResolutionError::NoCompanion(image) => image,
            ResolutionError::AmbiguousCompanion { image, .. }
            | ResolutionError::CompanionMissing { image, .. }
            | ResolutionError::CompanionShared { image, .. } => image,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            ResolutionError::UnknownSensor(_) => ErrorCode::RESOLUTION_UNKNOWN_SENSOR,
            ResolutionError::NoCompanion(_) => ErrorCode::RESOLUTION_NO_COMPANION,
            ResolutionError::AmbiguousCompanion { .. } => ErrorCode::RESOLUTION_AMBIGUOUS,
            ResolutionError::CompanionMissing { .. } => ErrorCode::RESOLUTION_MISSING_FILE,
            ResolutionError::CompanionShared { .. } => ErrorCode::RESOLUTION_SHARED_COMPANION,
        }
    }
}

impl From<ResolutionError> for PanbatchError {
    fn from(err: ResolutionError) -> Self {
        PanbatchError::resolution(err.code(), err.to_string(), err.image().clone())
    }
}
