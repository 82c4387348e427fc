//! Alerting System
//!
//! Decides which alerts merit a notification and where they go:
//! ignore and critical rules, windowed deduplication over a bounded LRU
//! store, and non-exclusive fan-out to named channels.

mod alert;
mod channel;
mod config;
mod dedup;
mod error;
mod manager;
mod matcher;
mod sink;

pub use alert::{Alert, Severity};
pub use channel::{Channel, ChannelRouter};
pub use config::{AlertConfig, MatcherConfig};
pub use dedup::{AlertStat, DedupOutcome, DedupStore, DEFAULT_CAPACITY};
pub use error::{ConfigError, SinkError};
pub use manager::{AlertManager, Decision, Delivery, ProcessReport};
pub use matcher::{AlertMatcher, RuleSet};
pub use sink::{NotificationSink, SuppressedCount};
