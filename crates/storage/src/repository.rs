use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String key/value persistence for client-side counters (XP, streak, last visit).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// A response body kept for offline use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub body: String,
    pub stored_at: DateTime<Utc>,
}

/// Response storage keyed by request path.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Look up the cached body for `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cache cannot be read.
    async fn get(&self, path: &str) -> Result<Option<CachedResponse>, StorageError>;

    /// Cache `body` for `path`, overwriting an older entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be written.
    async fn put(&self, path: &str, body: &str, stored_at: DateTime<Utc>)
    -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and offline runs.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
    responses: Arc<Mutex<HashMap<String, CachedResponse>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl ResponseCache for InMemoryRepository {
    async fn get(&self, path: &str) -> Result<Option<CachedResponse>, StorageError> {
        let guard = self
            .responses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(path).cloned())
    }

    async fn put(
        &self,
        path: &str,
        body: &str,
        stored_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .responses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            path.to_string(),
            CachedResponse {
                body: body.to_string(),
                stored_at,
            },
        );
        Ok(())
    }
}

/// Aggregates the key/value store and the response cache behind trait objects
/// for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
    pub responses: Arc<dyn ResponseCache>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let kv: Arc<dyn KeyValueStore> = Arc::new(repo.clone());
        let responses: Arc<dyn ResponseCache> = Arc::new(repo);
        Self { kv, responses }
    }
}
