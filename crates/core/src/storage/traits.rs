//! Trait definitions for the storage module.

use async_trait::async_trait;
use bytes::Bytes;

use super::error::StorageError;

/// A content store holding source videos and derived HLS outputs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Fetches the full contents of an object.
    async fn fetch(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Writes an object, replacing any previous contents.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Whether an object exists under the key.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Deletes an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Rejects keys that are empty, absolute, or contain empty, `.` or `..` segments.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::invalid_key(key, "key is empty"));
    }
    if key.starts_with('/') {
        return Err(StorageError::invalid_key(key, "key must be relative"));
    }
    if key.contains('\\') || key.contains('\0') {
        return Err(StorageError::invalid_key(key, "illegal character"));
    }
    for segment in key.split('/') {
        match segment {
            "" => return Err(StorageError::invalid_key(key, "empty path segment")),
            "." | ".." => return Err(StorageError::invalid_key(key, "relative path segment")),
            _ => {}
        }
    }
    Ok(())
}
