//! Logging notification sink

use alerting::{Alert, NotificationSink, SinkError, SuppressedCount};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

/// Sink that records each notification in the service log.
///
/// Stands in for a chat transport; delivery cannot fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(
        &self,
        channel: &str,
        alert: &Alert,
        suppressed: SuppressedCount,
        at: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        info!(
            "[{}] {} {} {}/{} on {} (suppressed since last: {}, at {}) {}",
            channel,
            alert.site.as_deref().unwrap_or("-"),
            alert.severity,
            alert.app,
            alert.error_code,
            alert.action.as_deref().unwrap_or("-"),
            suppressed,
            at.to_rfc3339(),
            alert.dashboard_url.as_deref().unwrap_or("")
        );
        Ok(())
    }
}
