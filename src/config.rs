//! Delivery constants and bridge configuration.

use std::time::Duration;

/// Deadline for a single delivery attempt of an ack-expecting message.
pub const ACK_TIMEOUT_MS: u64 = 3000;

/// Number of redeliveries after the first attempt before a message is dropped.
pub const MAX_RETRIES: u32 = 3;

/// Tunables for one bridge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Fixed per-attempt acknowledgment deadline. No backoff is applied.
    pub ack_timeout: Duration,
    /// Retry budget per logical message.
    pub max_retries: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_millis(ACK_TIMEOUT_MS),
            max_retries: MAX_RETRIES,
        }
    }
}

impl BridgeConfig {
    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}
