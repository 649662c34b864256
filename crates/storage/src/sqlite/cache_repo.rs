use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{CachedResponse, ResponseCache, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl ResponseCache for SqliteRepository {
    async fn get(&self, path: &str) -> Result<Option<CachedResponse>, StorageError> {
        let row = sqlx::query("SELECT body, stored_at FROM response_cache WHERE path = ?1")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let body: String = row.try_get("body").map_err(ser)?;
        let stored_at: DateTime<Utc> = row.try_get("stored_at").map_err(ser)?;
        Ok(Some(CachedResponse { body, stored_at }))
    }

    async fn put(
        &self,
        path: &str,
        body: &str,
        stored_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO response_cache (path, body, stored_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(path) DO UPDATE SET
                body = excluded.body,
                stored_at = excluded.stored_at
            ",
        )
        .bind(path)
        .bind(body)
        .bind(stored_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
