//! Error types for pdb-dl
//!
//! Precondition failures (`MissingDebugFile`, `MissingConfiguration`, `Config`) abort an
//! acquisition before anything is spawned, fetched or written. The remaining variants are
//! produced by fetchers and extractors and are absorbed by the downloader's fallback logic,
//! which reports them as a failed [`AcquisitionResult`](crate::types::AcquisitionResult).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdb-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pdb-dl
#[derive(Debug, Error)]
pub enum Error {
    /// The target binary carries no debug file name
    #[error("can't find debug filename")]
    MissingDebugFile,

    /// Symbol server or user agent configuration is missing
    #[error("can't retrieve pdb configuration{}", describe_key(.key))]
    MissingConfiguration {
        /// The configuration key that is missing, when known
        key: Option<String>,
    },

    /// Configuration is present but invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "symbol_server")
        key: Option<String>,
    },

    /// A required external tool is not installed or not usable
    #[error("tool unavailable: {0}")]
    ToolUnavailable(String),

    /// Transfer of a resource from the symbol server failed
    #[error("fetch of {url} failed: {reason}")]
    FetchFailed {
        /// The resource URL that was requested
        url: String,
        /// The reason the transfer failed
        reason: String,
    },

    /// Cabinet extraction failed
    #[error("extraction failed for {archive}: {reason}")]
    ExtractionFailed {
        /// The archive file that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// An archive name could not be derived from the debug file name
    #[error("invalid debug file name: {0:?}")]
    InvalidName(String),

    /// The target binary could not be read for debug information
    #[error("binary info error: {0}")]
    BinaryInfo(String),

    /// External tool could not be executed
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn describe_key(key: &Option<String>) -> String {
    match key {
        Some(key) => format!(": {key} is not set"),
        None => String::new(),
    }
}

impl Error {
    /// Whether this error is a precondition failure reported before any side effect
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::MissingDebugFile | Error::MissingConfiguration { .. } | Error::Config { .. }
        )
    }
}
