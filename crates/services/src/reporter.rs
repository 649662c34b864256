use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use drill_core::model::{ReviewEvent, SessionReport};

use crate::api::BackendClient;
use crate::error::ApiError;

/// Destination for review and session events.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn review(&self, event: &ReviewEvent) -> Result<(), ApiError>;
    async fn session(&self, report: &SessionReport) -> Result<(), ApiError>;
}

#[async_trait]
impl ProgressSink for BackendClient {
    async fn review(&self, event: &ReviewEvent) -> Result<(), ApiError> {
        self.post_review(event).await
    }

    async fn session(&self, report: &SessionReport) -> Result<(), ApiError> {
        self.post_session(report).await
    }
}

/// Fire-and-forget progress reporting.
///
/// Each event is sent on its own task; failures are logged and dropped, and
/// nothing is retried. The returned handle is only useful to tests.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    sink: Option<Arc<dyn ProgressSink>>,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// A reporter that drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn report_review(&self, event: ReviewEvent) -> Option<JoinHandle<()>> {
        let sink = Arc::clone(self.sink.as_ref()?);
        spawn_detached(async move {
            if let Err(err) = sink.review(&event).await {
                tracing::warn!(item = %event.item_id, error = %err, "review report dropped");
            }
        })
    }

    pub fn report_session(&self, report: SessionReport) -> Option<JoinHandle<()>> {
        let sink = Arc::clone(self.sink.as_ref()?);
        spawn_detached(async move {
            match sink.session(&report).await {
                Ok(()) => tracing::debug!(phase = report.phase, "session reported"),
                Err(err) => {
                    tracing::warn!(phase = report.phase, error = %err, "session report dropped");
                }
            }
        })
    }
}

fn spawn_detached<F>(task: F) -> Option<JoinHandle<()>>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => Some(handle.spawn(task)),
        Err(_) => {
            tracing::warn!("no async runtime, progress event dropped");
            None
        }
    }
}
