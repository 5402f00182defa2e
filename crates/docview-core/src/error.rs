//! Error types for the viewer core

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    #[error("Unsupported file type. Supported formats: {supported}")]
    UnsupportedFormat { supported: String },

    #[error("Failed to load document: {0}")]
    LoadFailed(String),

    #[error("Invalid security policy: {0}")]
    InvalidPolicy(String),

    #[error("Platform action failed: {0}")]
    Platform(String),
}
