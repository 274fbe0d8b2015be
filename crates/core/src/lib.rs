pub mod auth;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod storage;
pub mod testing;
pub mod transcode;

pub use auth::{
    create_authenticator, require_admin, ApiKeyAuthenticator, AuthError, AuthRequest,
    Authenticator, Identity, NoneAuthenticator, Role,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, SanitizedConfig, ServerConfig,
};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, PoolStatus, StartedTranscode, TranscodeOrchestrator,
};
pub use progress::{JobState, ProgressConfig, ProgressEntry, ProgressTracker, RunId, TranscodeStatus};
pub use storage::{
    create_object_store, FsObjectStore, HttpObjectStore, ObjectStore, StorageBackend,
    StorageConfig, StorageError,
};
pub use transcode::{
    hls_key, normalize_video_key, EngineError, FfmpegToolchain, Rendition, Stage, Toolchain,
    ToolchainError, TranscodeConfig, TranscodeEngine, TranscodeOutcome,
};
