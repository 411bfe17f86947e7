//! `[transport]` section configuration.
//!
//! Retry and timeout behavior for coordinator-to-shard requests.
//!
//! # Example
//!
//! ```toml
//! [transport]
//! max_attempts = 3        # Per shard per round, including the first try
//! backoff_ms = 25         # Doubled after each failed attempt
//! max_backoff_ms = 1000   # Upper bound on a single backoff
//! timeout_ms = 5000       # Per request
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 25,
            max_backoff_ms: 1000,
            timeout_ms: 5000,
        }
    }
}

impl TransportConfig {
    pub const MAX_ATTEMPTS: FieldPath = FieldPath::new("transport.max_attempts");
    pub const MAX_BACKOFF_MS: FieldPath = FieldPath::new("transport.max_backoff_ms");
    pub const TIMEOUT_MS: FieldPath = FieldPath::new("transport.timeout_ms");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_attempts == 0 {
            diag.error_with_hint(
                Self::MAX_ATTEMPTS,
                "must be at least 1",
                "1 disables retries",
            );
        }
        if self.timeout_ms == 0 {
            diag.error(Self::TIMEOUT_MS, "must be positive");
        }
        if self.max_backoff_ms < self.backoff_ms {
            diag.error(
                Self::MAX_BACKOFF_MS,
                format!(
                    "{} is below backoff_ms ({})",
                    self.max_backoff_ms, self.backoff_ms
                ),
            );
        }
    }
}
