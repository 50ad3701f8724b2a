//! Error types for accessibility modeling.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using AccessError.
pub type AccessResult<T> = Result<T, AccessError>;

/// Primary error type for accessibility modeling.
///
/// The first four variants are the modeling taxonomy. None of them is
/// retried: a run either skips the affected step or aborts.
#[derive(Debug, Error)]
pub enum AccessError {
    // === Modeling Taxonomy ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing {layer} data: {}", path.display())]
    MissingData { layer: String, path: PathBuf },

    #[error("Bad {layer} data: {reason}")]
    BadData { layer: String, reason: String },

    #[error("Modeling failed: {message}")]
    Modeling { message: String, diagnostics: String },

    // === Transport Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AccessError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn missing_data(layer: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::MissingData {
            layer: layer.into(),
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn bad_data(layer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadData {
            layer: layer.into(),
            reason: reason.into(),
        }
    }

    pub fn modeling(message: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::Modeling {
            message: message.into(),
            diagnostics: diagnostics.into(),
        }
    }

    /// Short category name, stable enough for log fields and exit codes.
    pub fn kind(&self) -> &'static str {
        match self {
            AccessError::Configuration(_) => "configuration",
            AccessError::MissingData { .. } => "missing_data",
            AccessError::BadData { .. } => "bad_data",
            AccessError::Modeling { .. } => "modeling",
            AccessError::Io(_) => "io",
            AccessError::Json(_) => "json",
        }
    }

    /// Process exit code used by the command line driver.
    pub fn exit_code(&self) -> i32 {
        match self {
            AccessError::Configuration(_) => 2,
            AccessError::MissingData { .. } => 3,
            AccessError::BadData { .. } => 4,
            AccessError::Modeling { .. } => 5,
            AccessError::Io(_) | AccessError::Json(_) => 1,
        }
    }
}
