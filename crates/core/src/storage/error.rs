//! Error types for the storage module.

use thiserror::Error;

/// Errors returned by an object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object exists under the key.
    #[error("Object not found: {key}")]
    NotFound { key: String },

    /// The key is empty or would escape the store root.
    #[error("Invalid object key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Writing an object failed.
    #[error("Failed to write object {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    /// The backing service could not be reached or answered unexpectedly.
    #[error("Object store unavailable: {0}")]
    Unavailable(String),

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn write_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(error: reqwest::Error) -> Self {
        StorageError::Unavailable(error.to_string())
    }
}
