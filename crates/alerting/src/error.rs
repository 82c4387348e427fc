//! Alerting Error Types

use thiserror::Error;

/// Errors in the alert configuration, detected at construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Dedup window must be at least one hour
    #[error("Dedup window must be positive, got {0} hours")]
    InvalidWindow(u32),

    /// Dedup store must hold at least one key
    #[error("Dedup store capacity must be greater than zero")]
    ZeroCapacity,

    /// Channel configured with an empty name
    #[error("Channel name must not be blank")]
    BlankChannelName,

    /// A rule lists an empty value in one of its dimensions
    #[error("Rule {rule} has a blank entry in {field}")]
    BlankRuleEntry { rule: String, field: &'static str },
}

/// Errors reported by a notification sink
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// Delivery was attempted and rejected
    #[error("Delivery to channel {channel} failed: {reason}")]
    Delivery { channel: String, reason: String },

    /// Transport not reachable
    #[error("Notification transport unavailable: {0}")]
    Unavailable(String),
}
