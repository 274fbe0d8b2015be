use hlsmith_core::{Authenticator, Config, SanitizedConfig, TranscodeOrchestrator};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    orchestrator: Arc<TranscodeOrchestrator>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        orchestrator: Arc<TranscodeOrchestrator>,
    ) -> Self {
        Self {
            config,
            authenticator,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn orchestrator(&self) -> &TranscodeOrchestrator {
        &self.orchestrator
    }
}
