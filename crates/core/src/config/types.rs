use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::orchestrator::OrchestratorConfig;
use crate::progress::ProgressConfig;
use crate::storage::{StorageBackend, StorageConfig};
use crate::transcode::TranscodeConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Administrator key (required when method = "api_key").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Keys that authenticate without administrative privilege.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub viewer_keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey => "api_key",
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub storage: SanitizedStorageConfig,
    pub transcode: TranscodeConfig,
    pub orchestrator: OrchestratorConfig,
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
    pub viewer_keys: usize,
}

/// Sanitized storage config (bearer token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_base_url: Option<String>,
    pub bearer_token_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let storage = &config.storage;
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method.as_str().to_string(),
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                viewer_keys: config.auth.viewer_keys.len(),
            },
            server: config.server.clone(),
            storage: SanitizedStorageConfig {
                backend: storage.backend.as_str().to_string(),
                fs_root: match storage.backend {
                    StorageBackend::Fs => Some(storage.fs.root.display().to_string()),
                    StorageBackend::Http => None,
                },
                http_base_url: storage.http.as_ref().map(|h| h.base_url.clone()),
                bearer_token_configured: storage
                    .http
                    .as_ref()
                    .and_then(|h| h.bearer_token.as_ref())
                    .is_some(),
            },
            transcode: config.transcode.clone(),
            orchestrator: config.orchestrator.clone(),
            progress: config.progress.clone(),
        }
    }
}
