//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the toolchain and storage
//! traits, allowing the engine and orchestrator to be exercised without
//! ffmpeg or a real object store.
//!
//! # Example
//!
//! ```rust,ignore
//! use hlsmith_core::testing::{MockObjectStore, MockToolchain};
//!
//! let store = Arc::new(MockObjectStore::new());
//! let toolchain = Arc::new(MockToolchain::new());
//!
//! store.insert("uploads/lecture1.mp4", b"...".to_vec()).await;
//! toolchain.set_encode_delay(Duration::from_millis(50)).await;
//!
//! // Build a TranscodeEngine with them...
//! ```

mod mock_object_store;
mod mock_toolchain;

pub use mock_object_store::{MockObjectStore, StoreCall, StoredObject};
pub use mock_toolchain::{MockToolchain, RecordedEncode};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::sync::Arc;

    use crate::progress::ProgressTracker;
    use crate::storage::ObjectStore;
    use crate::transcode::{MediaInfo, Rendition, Toolchain, TranscodeConfig, TranscodeEngine};

    /// A source of the given height with a matching 16:9 width.
    pub fn media_info(path: &Path, height: u32, with_audio: bool) -> MediaInfo {
        MediaInfo {
            path: path.to_path_buf(),
            size_bytes: 5 * 1024 * 1024, // 5 MB
            duration_secs: 30.0,
            format: "mp4".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(height * 16 / 9),
            video_height: Some(height),
            video_fps: Some(25.0),
            audio_codec: with_audio.then(|| "aac".to_string()),
            audio_channels: with_audio.then_some(2),
        }
    }

    /// An audio-only source.
    pub fn audio_only_info(path: &Path) -> MediaInfo {
        MediaInfo {
            video_codec: None,
            video_width: None,
            video_height: None,
            video_fps: None,
            ..media_info(path, 0, true)
        }
    }

    /// A two-rendition ladder that keeps test runs short.
    pub fn small_ladder() -> Vec<Rendition> {
        vec![
            Rendition::new("480p", 854, 480, 1400, 128),
            Rendition::new("240p", 426, 240, 400, 64),
        ]
    }

    /// Transcode config with scratch space under `temp_dir`.
    pub fn transcode_config(temp_dir: &Path) -> TranscodeConfig {
        TranscodeConfig::default().with_temp_dir(temp_dir.to_path_buf())
    }

    /// Engine wired to the given store and toolchain with a fresh tracker.
    pub fn engine(
        config: TranscodeConfig,
        store: Arc<dyn ObjectStore>,
        toolchain: Arc<dyn Toolchain>,
    ) -> TranscodeEngine {
        TranscodeEngine::new(config, store, toolchain, ProgressTracker::default())
    }
}
