//! Storage gateway for source videos and HLS outputs.
//!
//! The `ObjectStore` trait is the only way the transcode engine and the
//! orchestrator touch stored content. Two backends are provided:
//!
//! - `FsObjectStore`: keys resolved against a local directory
//! - `HttpObjectStore`: GET/PUT/HEAD/DELETE against `{base_url}/{key}`

mod config;
mod error;
mod fs;
mod http;
mod traits;

use std::sync::Arc;

pub use config::{FsStorageConfig, HttpStorageConfig, StorageBackend, StorageConfig};
pub use error::StorageError;
pub use fs::FsObjectStore;
pub use http::HttpObjectStore;
pub use traits::{validate_key, ObjectStore};

/// Creates the object store selected by the configuration.
pub fn create_object_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackend::Fs => Ok(Arc::new(FsObjectStore::new(config.fs.clone()))),
        StorageBackend::Http => {
            let http = config.http.clone().ok_or_else(|| {
                StorageError::Unavailable("storage.http section is required".to_string())
            })?;
            Ok(Arc::new(HttpObjectStore::new(http)?))
        }
    }
}
