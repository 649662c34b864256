//! Offline fetch policy: network-first for API reads, cache-first for
//! everything else.

use std::sync::Arc;

use drill_core::Clock;
use storage::repository::ResponseCache;

use crate::api::Transport;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Try the network; on failure serve the last cached body.
    NetworkFirst,
    /// Serve from cache; on a miss, fetch and cache.
    CacheFirst,
}

impl FetchPolicy {
    /// The fixed policy for a request path.
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        if path.starts_with("/api/") {
            FetchPolicy::NetworkFirst
        } else {
            FetchPolicy::CacheFirst
        }
    }
}

/// GET requests routed through [`FetchPolicy`] with a persistent cache.
#[derive(Clone)]
pub struct CachedFetcher {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn ResponseCache>,
    clock: Clock,
}

impl CachedFetcher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<dyn ResponseCache>, clock: Clock) -> Self {
        Self {
            transport,
            cache,
            clock,
        }
    }

    /// Fetch `path` according to its policy.
    ///
    /// # Errors
    ///
    /// Returns the network error when the network fails and nothing is cached,
    /// or a cache error when a cache-first read cannot consult storage.
    pub async fn get(&self, path: &str) -> Result<String, ApiError> {
        match FetchPolicy::for_path(path) {
            FetchPolicy::NetworkFirst => self.network_first(path).await,
            FetchPolicy::CacheFirst => self.cache_first(path).await,
        }
    }

    async fn network_first(&self, path: &str) -> Result<String, ApiError> {
        match self.transport.get(path).await {
            Ok(body) => {
                self.store(path, &body).await;
                Ok(body)
            }
            Err(err) => match self.cache.get(path).await {
                Ok(Some(cached)) => {
                    tracing::debug!(path, error = %err, "network failed, serving cached response");
                    Ok(cached.body)
                }
                Ok(None) => Err(err),
                Err(cache_err) => {
                    tracing::warn!(path, error = %cache_err, "response cache unreadable");
                    Err(err)
                }
            },
        }
    }

    async fn cache_first(&self, path: &str) -> Result<String, ApiError> {
        if let Some(cached) = self.cache.get(path).await? {
            return Ok(cached.body);
        }
        let body = self.transport.get(path).await?;
        self.store(path, &body).await;
        Ok(body)
    }

    async fn store(&self, path: &str, body: &str) {
        if let Err(err) = self.cache.put(path, body, self.clock.now()).await {
            tracing::warn!(path, error = %err, "failed to cache response");
        }
    }
}
