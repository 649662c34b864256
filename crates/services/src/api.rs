use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use drill_core::Clock;
use drill_core::model::{MappingTable, ReviewEvent, SessionReport};
use storage::repository::ResponseCache;

use crate::error::ApiError;
use crate::offline::CachedFetcher;

pub const MAPPINGS_PATH: &str = "/api/mappings";
pub const PROGRESS_PATH: &str = "/api/progress";
pub const REVIEW_PATH: &str = "/api/review";
pub const SESSION_PATH: &str = "/api/session";

/// Raw request plumbing underneath the backend client.
///
/// Implementations return the body of successful responses only; any
/// non-success status is an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<String, ApiError>;
    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), ApiError>;
}

/// `reqwest` transport against a base URL.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<String, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus {
                path: path.to_string(),
                status: response.status(),
            });
        }
        Ok(response.text().await?)
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), ApiError> {
        let response = self.client.post(self.url(path)).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus {
                path: path.to_string(),
                status: response.status(),
            });
        }
        Ok(())
    }
}

/// Transport used when no backend is configured; every request fails with
/// `ApiError::Disabled`, so cached responses are all that is served.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledTransport;

#[async_trait]
impl Transport for DisabledTransport {
    async fn get(&self, _path: &str) -> Result<String, ApiError> {
        Err(ApiError::Disabled)
    }

    async fn post(&self, _path: &str, _body: serde_json::Value) -> Result<(), ApiError> {
        Err(ApiError::Disabled)
    }
}

// ─── Response bodies ───────────────────────────────────────────────────────

/// Per-item review history from `GET /api/progress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProgress {
    pub item_id: String,
    pub item_type: String,
    #[serde(default)]
    pub repetitions: u32,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub wrong_count: u32,
}

/// A stored session summary from `GET /api/progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub phase: u8,
    pub mode: String,
    pub duration: u64,
    pub total: u32,
    pub correct: u32,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub items: Vec<ItemProgress>,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct CharacterBody {
    #[serde(default)]
    pinyin: String,
}

// ─── Client ────────────────────────────────────────────────────────────────

/// Typed access to the drill backend.
///
/// Reads go through the offline fetch policy; reports are posted directly.
#[derive(Clone)]
pub struct BackendClient {
    transport: Arc<dyn Transport>,
    fetcher: CachedFetcher,
}

impl BackendClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<dyn ResponseCache>, clock: Clock) -> Self {
        let fetcher = CachedFetcher::new(Arc::clone(&transport), cache, clock);
        Self { transport, fetcher }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.fetcher.get(path).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// # Errors
    ///
    /// Returns `ApiError` when neither the backend nor the cache can answer,
    /// or the body is not a mapping table.
    pub async fn mappings(&self) -> Result<MappingTable, ApiError> {
        self.get_json(MAPPINGS_PATH).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` when neither the backend nor the cache can answer.
    pub async fn progress(&self) -> Result<ProgressSnapshot, ApiError> {
        self.get_json(PROGRESS_PATH).await
    }

    /// Pinyin for one character; `None` when the backend has no reading.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the lookup fails.
    pub async fn character_pinyin(&self, character: char) -> Result<Option<String>, ApiError> {
        let body: CharacterBody = self.get_json(&character_path(character)).await?;
        let pinyin = body.pinyin.trim();
        Ok((!pinyin.is_empty()).then(|| pinyin.to_string()))
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the report or is unreachable.
    pub async fn post_review(&self, event: &ReviewEvent) -> Result<(), ApiError> {
        self.transport
            .post(REVIEW_PATH, serde_json::to_value(event)?)
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the report or is unreachable.
    pub async fn post_session(&self, report: &SessionReport) -> Result<(), ApiError> {
        self.transport
            .post(SESSION_PATH, serde_json::to_value(report)?)
            .await
    }
}

/// `/api/character/<percent-encoded char>`.
#[must_use]
pub fn character_path(character: char) -> String {
    let mut buf = [0_u8; 4];
    let encoded: String =
        url::form_urlencoded::byte_serialize(character.encode_utf8(&mut buf).as_bytes()).collect();
    format!("/api/character/{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubTransport;
    use drill_core::model::{DrillItem, ItemType};
    use drill_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn client(stub: &Arc<StubTransport>) -> BackendClient {
        BackendClient::new(
            Arc::clone(stub) as Arc<dyn Transport>,
            Arc::new(InMemoryRepository::new()),
            fixed_clock(),
        )
    }

    #[test]
    fn character_path_is_percent_encoded() {
        assert_eq!(character_path('的'), "/api/character/%E7%9A%84");
        assert_eq!(character_path('a'), "/api/character/a");
    }

    #[tokio::test]
    async fn decodes_mappings_and_progress() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(
            MAPPINGS_PATH,
            r#"{"initials":[{"pinyin":"b","zhuyin":"ㄅ","group":"labial"}],"finals":[]}"#,
        );
        stub.respond(
            PROGRESS_PATH,
            r#"{"items":[{"item_id":"b","item_type":"initial","repetitions":2,"correct_count":2,"wrong_count":1,"interval":1.0}],"sessions":[]}"#,
        );
        let client = client(&stub);

        let table = client.mappings().await.unwrap();
        assert_eq!(table.initials.len(), 1);
        assert!(table.special_syllables.is_empty());

        let progress = client.progress().await.unwrap();
        assert_eq!(progress.items[0].repetitions, 2);
        assert!(progress.sessions.is_empty());
    }

    #[tokio::test]
    async fn blank_character_reading_is_none() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(&character_path('中'), r#"{"character":"中","pinyin":"zhong"}"#);
        stub.respond(&character_path('x'), r#"{"character":"x","pinyin":""}"#);
        let client = client(&stub);

        assert_eq!(
            client.character_pinyin('中').await.unwrap(),
            Some("zhong".to_string())
        );
        assert_eq!(client.character_pinyin('x').await.unwrap(), None);
        assert!(client.character_pinyin('的').await.is_err());
    }

    #[tokio::test]
    async fn posts_report_bodies() {
        let stub = Arc::new(StubTransport::new());
        let client = client(&stub);
        let item = DrillItem::new("zh", "ㄓ", "zh", ItemType::Initial).unwrap();

        client
            .post_review(&ReviewEvent::for_answer(&item, false))
            .await
            .unwrap();
        client
            .post_session(&SessionReport {
                phase: 1,
                mode: "typing".into(),
                duration: 42,
                total: 3,
                correct: 2,
            })
            .await
            .unwrap();

        let posts = stub.posts();
        assert_eq!(posts[0].0, REVIEW_PATH);
        assert_eq!(
            posts[0].1,
            serde_json::json!({"item_id": "zh", "item_type": "initial", "correct": false, "quality": 1})
        );
        assert_eq!(posts[1].0, SESSION_PATH);
        assert_eq!(posts[1].1["duration"], 42);
    }
}
