//! Mock object store for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::storage::{validate_key, ObjectStore, StorageError};

/// A call made against the store, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Fetch(String),
    Put(String),
    Exists(String),
    Delete(String),
}

/// An object held by the mock store.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// In-memory implementation of the ObjectStore trait.
///
/// Provides controllable behavior for testing:
/// - Seed source objects and inspect written outputs
/// - Record every call in order
/// - Fail the next call or writes to specific keys
/// - Slow writes down
///
/// # Example
///
/// ```rust,ignore
/// use hlsmith_core::testing::MockObjectStore;
///
/// let store = MockObjectStore::new();
/// store.insert("uploads/lecture1.mp4", b"...".to_vec()).await;
///
/// // ... run the engine ...
///
/// assert!(store.contains("hls/lecture1/master.m3u8").await);
/// ```
#[derive(Debug, Default)]
pub struct MockObjectStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    calls: Arc<RwLock<Vec<StoreCall>>>,
    next_error: Arc<RwLock<Option<StorageError>>>,
    failing_puts: Arc<RwLock<HashSet<String>>>,
    put_delay: Arc<RwLock<Duration>>,
}

impl MockObjectStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a call.
    pub async fn insert(&self, key: &str, data: Vec<u8>) {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data: Bytes::from(data),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    /// Get a stored object.
    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Get all recorded calls in order.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Keys written, in completion order.
    pub async fn put_keys(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                StoreCall::Put(key) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    /// Clear recorded calls.
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: StorageError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every write to `key` fail.
    pub async fn fail_put(&self, key: &str) {
        self.failing_puts.write().await.insert(key.to_string());
    }

    /// Set the simulated duration of each write.
    pub async fn set_put_delay(&self, delay: Duration) {
        *self.put_delay.write().await = delay;
    }

    async fn record(&self, call: StoreCall) -> Result<(), StorageError> {
        self.calls.write().await.push(call);
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, key: &str) -> Result<Bytes, StorageError> {
        self.record(StoreCall::Fetch(key.to_string())).await?;
        validate_key(key)?;
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;

        let delay = *self.put_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.record(StoreCall::Put(key.to_string())).await?;
        if self.failing_puts.read().await.contains(key) {
            return Err(StorageError::write_failed(key, "injected failure"));
        }

        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.record(StoreCall::Exists(key.to_string())).await?;
        validate_key(key)?;
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.record(StoreCall::Delete(key.to_string())).await?;
        validate_key(key)?;
        self.objects.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_fetch_and_record() {
        let store = MockObjectStore::new();
        store
            .put("hls/a/master.m3u8", Bytes::from_static(b"#EXTM3U\n"), "application/vnd.apple.mpegurl")
            .await
            .unwrap();

        let data = store.fetch("hls/a/master.m3u8").await.unwrap();
        assert_eq!(&data[..], b"#EXTM3U\n");
        assert_eq!(
            store.get("hls/a/master.m3u8").await.unwrap().content_type,
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(
            store.calls().await,
            vec![
                StoreCall::Put("hls/a/master.m3u8".to_string()),
                StoreCall::Fetch("hls/a/master.m3u8".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_insert_is_not_recorded() {
        let store = MockObjectStore::new();
        store.insert("uploads/a.mp4", b"video".to_vec()).await;
        assert_eq!(store.call_count().await, 0);
        assert!(store.exists("uploads/a.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_error_injection() {
        let store = MockObjectStore::new();
        store
            .set_next_error(StorageError::Unavailable("down".to_string()))
            .await;

        assert!(store.exists("uploads/a.mp4").await.is_err());
        // Error is consumed
        assert!(!store.exists("uploads/a.mp4").await.unwrap());

        store.fail_put("hls/a/master.m3u8").await;
        let result = store
            .put("hls/a/master.m3u8", Bytes::new(), "application/vnd.apple.mpegurl")
            .await;
        assert!(matches!(result, Err(StorageError::WriteFailed { .. })));
        assert!(!store.contains("hls/a/master.m3u8").await);
    }
}
