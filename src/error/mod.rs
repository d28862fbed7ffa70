//! Error taxonomy for panbatch.
//!
//! Only configuration problems abort a batch. Resolution problems exclude a
//! single image and surface in the log. Stage failures never become errors;
//! they are carried by the pipeline report.

use std::path::PathBuf;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum PanbatchError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("[E{code:04}] Cannot resolve {}: {message}", .image.display())]
    Resolution {
        code: u16,
        message: String,
        image: PathBuf,
    },

    #[error("[E{code:04}] Dispatch error: {message}")]
    Dispatch {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl PanbatchError {
    pub fn config(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn resolution(code: u16, message: impl Into<String>, image: impl Into<PathBuf>) -> Self {
        Self::Resolution {
            code,
            message: message.into(),
            image: image.into(),
        }
    }

    pub fn dispatch(code: u16, message: impl Into<String>) -> Self {
        Self::Dispatch {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause. Resolution errors carry none.
    pub fn with_source(mut self, cause: impl Into<BoxError>) -> Self {
        match &mut self {
            Self::Config { source, .. } | Self::Dispatch { source, .. } => {
                *source = Some(cause.into())
            }
            Self::Resolution { .. } => {}
        }
        self
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Resolution { code, .. }
            | Self::Dispatch { code, .. } => *code,
        }
    }

    /// Process exit status: 2 for a rejected configuration, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.is_config() {
            2
        } else {
            1
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

pub type Result<T> = std::result::Result<T, PanbatchError>;
