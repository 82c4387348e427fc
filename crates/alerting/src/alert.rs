//! Alert Event Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Warn,
    Error,
}

impl Severity {
    /// Upper-case name as it appears on the wire and in dedup keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured alert produced by the logging pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Source event id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Time the underlying event occurred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    /// Application that raised the alert
    pub app: String,
    /// Action (request handler, job, message listener) if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub severity: Severity,
    pub error_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Search index the event was collected into (trace, stat, event, ...)
    pub index: String,

    /// Site label, set only when a notification fires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Dashboard link, set only when a notification fires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
}

impl Alert {
    /// Create an alert with the required dimensions
    pub fn new(
        app: impl Into<String>,
        severity: Severity,
        error_code: impl Into<String>,
        index: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            date: None,
            app: app.into(),
            action: None,
            severity,
            error_code: error_code.into(),
            error_message: None,
            host: None,
            index: index.into(),
            site: None,
            dashboard_url: None,
        }
    }

    /// Set the action
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set the error message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Key under which repeated alerts are deduplicated.
    ///
    /// WARN and ERROR may share an error code, so severity is part of the key.
    /// Index and enrichment fields are not.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.app,
            self.action.as_deref().unwrap_or("null"),
            self.severity,
            self.error_code
        )
    }
}
