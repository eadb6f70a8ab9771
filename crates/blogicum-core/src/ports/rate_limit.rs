//! Rate limiting port.

use std::time::Duration;

use async_trait::async_trait;

/// Throttles requests per client key (usually the peer address).
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request for `key` and report whether it may proceed.
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;
}

/// Outcome of a single check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Wait before the next request for this key would be admitted.
    pub retry_after: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
