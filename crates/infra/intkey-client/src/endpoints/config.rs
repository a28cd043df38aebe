//! Contains the [`ClientConfig`] struct, which is used to configure endpoint clients.

use core::time::Duration;

/// Configuration for an HTTP endpoint client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for status queries.
    pub max_retries: u32,
    /// Backoff before the first retry, doubled on every attempt.
    pub initial_backoff: Duration,
    /// Upper bound on the backoff between retries.
    pub max_backoff: Duration,
}

impl ClientConfig {
    /// Backoff to wait after the given zero-based failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(attempt)).min(self.max_backoff)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(3),
        }
    }
}
