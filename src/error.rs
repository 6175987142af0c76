//! Error types for linkgrab
//!
//! This module provides the error taxonomy used across the request pipeline:
//! - Top-level [`Error`] for configuration, I/O, network and tool failures
//! - [`ExtractError`] for failures inside an extractor (tool exit, bad output, HTTP status)
//! - [`DeliveryError`] for failures of the reply channel while sending a result
//!
//! "Nothing extractable" is deliberately not an error: extractors return
//! `Ok(None)` for it. Cleanup failures are not represented here either; they
//! are reported through [`crate::cleanup::CleanupOutcome`] and logged only.

use crate::types::{Channel, Stage};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for linkgrab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for linkgrab
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "MAX_FILE_SIZE")
        key: Option<String>,
    },

    /// Input was not an absolute URL with scheme and host
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Extractor-level failure
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Reply channel failure while delivering
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// External tool execution failed (yt-dlp could not be spawned, etc.)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, disabled extractor, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A stage exceeded its configured time budget
    #[error("{stage} stage timed out after {seconds} seconds")]
    Timeout {
        /// Stage that was interrupted
        stage: Stage,
        /// Configured limit in seconds
        seconds: u64,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failures raised by an extractor while fetching media
#[derive(Debug, Error)]
pub enum ExtractError {
    /// External tool exited unsuccessfully
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        /// Tool name (e.g., "yt-dlp")
        tool: String,
        /// Exit status description
        status: String,
        /// Last meaningful line of the tool's stderr
        stderr: String,
    },

    /// Tool output could not be interpreted
    #[error("malformed extractor output: {reason}")]
    MalformedOutput {
        /// What was wrong with the output
        reason: String,
    },

    /// Remote server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    Http {
        /// URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Extractor reported success but the artifact is not on disk
    #[error("downloaded file missing at {path}")]
    MissingArtifact {
        /// The path where the artifact was expected
        path: PathBuf,
    },
}

/// Failures of the reply channel during delivery
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The transport rejected or failed to send a message
    #[error("sending {channel} failed: {reason}")]
    Send {
        /// Channel that was being used
        channel: Channel,
        /// Transport-supplied reason
        reason: String,
    },

    /// The artifact referenced by the media info does not exist
    #[error("media file not found at {path}")]
    MissingFile {
        /// Path referenced by the media info
        path: PathBuf,
    },
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Stage of the request pipeline this error is attributed to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::InvalidUrl(_) => Some(Stage::Validate),
            Error::Extraction(_) | Error::ExternalTool(_) | Error::NotSupported(_) => {
                Some(Stage::Extract)
            }
            Error::Delivery(_) => Some(Stage::Deliver),
            Error::Timeout { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
