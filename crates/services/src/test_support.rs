use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use storage::repository::{KeyValueStore, StorageError};

use crate::api::Transport;
use crate::error::ApiError;

/// Scripted transport: canned GET bodies, recorded POSTs, and an offline switch.
#[derive(Default)]
pub(crate) struct StubTransport {
    responses: Mutex<HashMap<String, String>>,
    posts: Mutex<Vec<(String, serde_json::Value)>>,
    offline: AtomicBool,
    gets: AtomicUsize,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, path: &str, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), body.to_string());
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn posts(&self) -> Vec<(String, serde_json::Value)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, path: &str) -> Result<String, ApiError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Disabled);
        }
        self.responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ApiError::HttpStatus {
                path: path.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), ApiError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Disabled);
        }
        self.posts.lock().unwrap().push((path.to_string(), body));
        Ok(())
    }
}

/// Key/value store whose every call fails, as a locked or missing database would.
pub(crate) struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Connection("database is locked".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("database is locked".into()))
    }
}
