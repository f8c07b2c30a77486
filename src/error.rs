//! Crate-wide error type
//!
//! Every build step surfaces its failure immediately; nothing is retried and
//! partially written output directories are left as they are.

use std::path::PathBuf;
use thiserror::Error;

use crate::exit_codes;

/// Build error types
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid or missing parameter, no input pages, unknown paper/gradient
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Required font or image resource unavailable after every fallback
    #[error("Resource unavailable: {0}")]
    Resource(String),

    /// Input image exists but cannot be decoded
    #[error("Cannot decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// PDF encoding failed
    #[error("PDF encoding failed: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        BuildError::Config(message.into())
    }

    /// True for errors caused by user-supplied input rather than the environment
    pub fn is_config(&self) -> bool {
        matches!(self, BuildError::Config(_) | BuildError::Decode { .. })
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Config(_) | BuildError::Decode { .. } => exit_codes::INVALID_CONFIG,
            BuildError::Resource(_) => exit_codes::RESOURCE_MISSING,
            BuildError::Io(_) => exit_codes::IO_ERROR,
            BuildError::Pdf(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

impl From<image::ImageError> for BuildError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => BuildError::Io(e),
            other => BuildError::Pdf(format!("image encoding: {other}")),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
