//! Rule Matching

use crate::alert::{Alert, Severity};
use crate::config::MatcherConfig;
use crate::error::ConfigError;
use std::collections::HashSet;

/// Predicate over an alert's app, error code, severity and index.
///
/// Each dimension is optional; `None` matches any value.
#[derive(Debug, Clone, Default)]
pub struct AlertMatcher {
    apps: Option<HashSet<String>>,
    error_codes: Option<HashSet<String>>,
    severity: Option<Severity>,
    indices: Option<HashSet<String>>,
}

impl AlertMatcher {
    /// Matcher accepting every alert (catch-all channels)
    pub fn any() -> Self {
        Self::default()
    }

    /// Build a matcher from its configuration. `rule` names the rule in errors.
    pub fn from_config(config: &MatcherConfig, rule: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            apps: dimension(&config.apps, rule, "apps")?,
            error_codes: dimension(&config.error_codes, rule, "error_codes")?,
            severity: config.severity,
            indices: dimension(&config.indices, rule, "indices")?,
        })
    }

    /// All configured dimensions must match
    pub fn matches(&self, alert: &Alert) -> bool {
        allows(&self.apps, &alert.app)
            && allows(&self.error_codes, &alert.error_code)
            && self.severity.map_or(true, |severity| severity == alert.severity)
            && allows(&self.indices, &alert.index)
    }
}

fn dimension(
    values: &[String],
    rule: &str,
    field: &'static str,
) -> Result<Option<HashSet<String>>, ConfigError> {
    if values.is_empty() {
        return Ok(None);
    }
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(ConfigError::BlankRuleEntry {
            rule: rule.to_string(),
            field,
        });
    }
    Ok(Some(values.iter().cloned().collect()))
}

fn allows(allowed: &Option<HashSet<String>>, value: &str) -> bool {
    allowed.as_ref().map_or(true, |set| set.contains(value))
}

/// List of matchers combined with OR. An empty set matches nothing.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    matchers: Vec<AlertMatcher>,
}

impl RuleSet {
    /// Build from a configured rule list; `name` prefixes rule names in errors
    pub fn from_configs(configs: &[MatcherConfig], name: &str) -> Result<Self, ConfigError> {
        let matchers = configs
            .iter()
            .enumerate()
            .map(|(i, config)| AlertMatcher::from_config(config, &format!("{}[{}]", name, i)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { matchers })
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.matchers.iter().any(|m| m.matches(alert))
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}
