//! Notification Sink Boundary

use crate::alert::Alert;
use crate::error::SinkError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Number of alerts suppressed before a notification.
///
/// On the wire this is `-1` when no suppression context applies (first
/// occurrence, or a critical alert that bypassed deduplication), otherwise the
/// count suppressed during the window that just elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "i64")]
pub enum SuppressedCount {
    NoContext,
    Since(u32),
}

impl SuppressedCount {
    /// Wire value used for [`SuppressedCount::NoContext`]
    pub const SENTINEL: i64 = -1;

    pub fn as_i64(self) -> i64 {
        match self {
            SuppressedCount::NoContext => Self::SENTINEL,
            SuppressedCount::Since(count) => i64::from(count),
        }
    }
}

impl From<SuppressedCount> for i64 {
    fn from(count: SuppressedCount) -> Self {
        count.as_i64()
    }
}

impl fmt::Display for SuppressedCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// Delivers a notification for one channel.
///
/// Called once per matching channel, after the dedup lock is released.
/// Failures are reported back per call and never retried by the engine.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        channel: &str,
        alert: &Alert,
        suppressed: SuppressedCount,
        at: DateTime<Utc>,
    ) -> Result<(), SinkError>;
}
