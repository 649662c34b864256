//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::catalog::CatalogError;
use drill_core::model::ItemError;
use drill_core::pool::PoolError;
use drill_core::session::SessionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the backend client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("backend is not configured")]
    Disabled,
    #[error("request for {path} failed with status {status}")]
    HttpStatus {
        path: String,
        status: reqwest::StatusCode,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Cache(#[from] StorageError),
}

/// Errors emitted while preparing or driving a drill session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DrillError {
    #[error("rule topic {topic} has no quiz")]
    NoQuiz { topic: String },
    #[error("speed duration must be one of {offered:?}")]
    UnsupportedDuration { offered: Vec<u32> },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Item(#[from] ItemError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Drill(#[from] DrillError),
}
