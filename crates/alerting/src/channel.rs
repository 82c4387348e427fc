//! Channel Routing

use crate::alert::Alert;
use crate::config::MatcherConfig;
use crate::error::ConfigError;
use crate::matcher::AlertMatcher;
use std::collections::BTreeMap;

/// A named notification destination with its own matcher
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    matcher: AlertMatcher,
}

impl Channel {
    pub fn new(name: impl Into<String>, matcher: AlertMatcher) -> Self {
        Self {
            name: name.into(),
            matcher,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.matcher.matches(alert)
    }
}

/// Immutable channel list, evaluated in full for every notification
#[derive(Debug, Clone, Default)]
pub struct ChannelRouter {
    channels: Vec<Channel>,
}

impl ChannelRouter {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    /// Build from the configured name-to-rule map (iterated in name order)
    pub fn from_config(channels: &BTreeMap<String, MatcherConfig>) -> Result<Self, ConfigError> {
        let channels = channels
            .iter()
            .map(|(name, rule)| {
                if name.trim().is_empty() {
                    return Err(ConfigError::BlankChannelName);
                }
                let matcher = AlertMatcher::from_config(rule, &format!("channels.{}", name))?;
                Ok(Channel::new(name.clone(), matcher))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { channels })
    }

    /// Every channel whose matcher accepts `alert`. Non-exclusive.
    pub fn route<'a>(&'a self, alert: &'a Alert) -> impl Iterator<Item = &'a Channel> + 'a {
        self.channels.iter().filter(move |channel| channel.matches(alert))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(Channel::name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
