use std::collections::HashSet;

use super::{
    types::{AuthMethod, Config},
    ConfigError,
};
use crate::progress::MAX_RETENTION_SECS;
use crate::storage::StorageBackend;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - API key auth has a non-empty admin key
/// - HTTP storage has its section
/// - Rendition ladder is non-empty, uniquely named, with non-zero sizes
/// - Segment duration, timeout and worker count are positive
/// - Progress retention is between 1 second and `MAX_RETENTION_SECS`
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().is_none_or(str::is_empty)
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when method = \"api_key\"".to_string(),
        ));
    }

    if config.storage.backend == StorageBackend::Http && config.storage.http.is_none() {
        return Err(ConfigError::ValidationError(
            "storage.http section is required when backend = \"http\"".to_string(),
        ));
    }

    let transcode = &config.transcode;
    if transcode.renditions.is_empty() {
        return Err(ConfigError::ValidationError(
            "transcode.renditions cannot be empty".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for rendition in &transcode.renditions {
        if rendition.name.is_empty()
            || rendition.name.contains('/')
            || !names.insert(rendition.name.as_str())
        {
            return Err(ConfigError::ValidationError(format!(
                "invalid or duplicate rendition name: {:?}",
                rendition.name
            )));
        }
        if rendition.width == 0 || rendition.height == 0 || rendition.video_bitrate_kbps == 0 {
            return Err(ConfigError::ValidationError(format!(
                "rendition {} must have non-zero width, height and video bitrate",
                rendition.name
            )));
        }
    }

    if transcode.segment_duration_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcode.segment_duration_secs must be at least 1".to_string(),
        ));
    }

    if transcode.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcode.timeout_secs must be at least 1".to_string(),
        ));
    }

    if config.orchestrator.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_concurrent_jobs must be at least 1".to_string(),
        ));
    }

    let retention = config.progress.retention_secs;
    if retention == 0 || retention > MAX_RETENTION_SECS {
        return Err(ConfigError::ValidationError(format!(
            "progress.retention_secs must be between 1 and {}",
            MAX_RETENTION_SECS
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, ServerConfig};
    use crate::orchestrator::OrchestratorConfig;
    use crate::progress::ProgressConfig;
    use crate::storage::StorageConfig;
    use crate::transcode::{Rendition, TranscodeConfig};

    fn valid_config() -> Config {
        Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                api_key: None,
                viewer_keys: vec![],
            },
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            transcode: TranscodeConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            progress: ProgressConfig::default(),
        }
    }

    fn assert_invalid(config: &Config) {
        let result = validate_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_api_key_required() {
        let mut config = valid_config();
        config.auth.method = AuthMethod::ApiKey;
        assert_invalid(&config);

        config.auth.api_key = Some(String::new());
        assert_invalid(&config);

        config.auth.api_key = Some("secret".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_http_storage_requires_section() {
        let mut config = valid_config();
        config.storage.backend = StorageBackend::Http;
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_empty_ladder_fails() {
        let mut config = valid_config();
        config.transcode.renditions.clear();
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_duplicate_rendition_fails() {
        let mut config = valid_config();
        let first = config.transcode.renditions[0].clone();
        config.transcode.renditions.push(first);
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_zero_sized_rendition_fails() {
        let mut config = valid_config();
        config.transcode.renditions = vec![Rendition::new("bad", 0, 480, 1000, 128)];
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_zero_segment_duration_fails() {
        let mut config = valid_config();
        config.transcode.segment_duration_secs = 0;
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_zero_workers_fails() {
        let mut config = valid_config();
        config.orchestrator.max_concurrent_jobs = 0;
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_retention_bounds() {
        let mut config = valid_config();
        for secs in [0, MAX_RETENTION_SECS + 1, 10_000_000_000_000_000, u64::MAX] {
            config.progress.retention_secs = secs;
            assert_invalid(&config);
        }

        config.progress.retention_secs = MAX_RETENTION_SECS;
        assert!(validate_config(&config).is_ok());
        config.progress.retention_secs = 1;
        assert!(validate_config(&config).is_ok());
    }
}
