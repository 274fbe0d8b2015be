//! Configuration for the storage module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Available object store backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Local directory.
    #[default]
    Fs,
    /// Plain HTTP object endpoint (GET/PUT/HEAD/DELETE on `{base_url}/{key}`).
    Http,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fs => "fs",
            Self::Http => "http",
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub fs: FsStorageConfig,
    #[serde(default)]
    pub http: Option<HttpStorageConfig>,
}

/// Filesystem store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsStorageConfig {
    /// Directory that object keys are resolved against.
    #[serde(default = "default_fs_root")]
    pub root: PathBuf,
}

impl Default for FsStorageConfig {
    fn default() -> Self {
        Self {
            root: default_fs_root(),
        }
    }
}

fn default_fs_root() -> PathBuf {
    PathBuf::from("storage")
}

/// HTTP store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpStorageConfig {
    /// Base URL, e.g. "https://media.example.com/bucket".
    pub base_url: String,
    /// Optional bearer token sent with every request.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_http_timeout() -> u64 {
    60
}
