//! Alert configuration

use crate::alert::Severity;
use crate::dedup::DEFAULT_CAPACITY;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single matcher rule. Empty lists and an unset severity match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Allowed applications
    pub apps: Vec<String>,
    /// Allowed error codes
    pub error_codes: Vec<String>,
    /// Exact severity
    pub severity: Option<Severity>,
    /// Allowed source indices
    pub indices: Vec<String>,
}

impl MatcherConfig {
    /// Rule matching every alert
    pub fn any() -> Self {
        Self::default()
    }

    pub fn apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apps = apps.into_iter().map(Into::into).collect();
        self
    }

    pub fn error_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.error_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn indices<I, S>(mut self, indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indices = indices.into_iter().map(Into::into).collect();
        self
    }
}

/// Alert engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Alerts matching any of these are dropped
    pub ignore_errors: Vec<MatcherConfig>,
    /// Alerts matching any of these bypass deduplication
    pub critical_errors: Vec<MatcherConfig>,
    /// Channel name to routing rule
    pub channels: BTreeMap<String, MatcherConfig>,
    /// Dedup window (hours, default: 4)
    pub timespan_hours: u32,
    /// Site label attached to outgoing notifications
    pub site: String,
    /// Dashboard link attached to outgoing notifications; `{index}` is
    /// replaced with the alert's index
    pub dashboard_url: String,
    /// Maximum number of distinct alert keys remembered (default: 1000)
    pub dedup_capacity: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            ignore_errors: Vec::new(),
            critical_errors: Vec::new(),
            channels: BTreeMap::new(),
            timespan_hours: 4,
            site: String::new(),
            dashboard_url: String::new(),
            dedup_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl AlertConfig {
    /// Check the scalar settings. Rule entries are checked when the matchers
    /// are built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timespan_hours == 0 {
            return Err(ConfigError::InvalidWindow(self.timespan_hours));
        }
        if self.dedup_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.channels.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::BlankChannelName);
        }
        Ok(())
    }

    /// Dedup window as a duration
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.timespan_hours))
    }
}
