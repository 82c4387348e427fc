//! Bounded Dedup Store

use crate::error::ConfigError;
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Default number of alert keys remembered
pub const DEFAULT_CAPACITY: usize = 1000;

/// Per-key dedup state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertStat {
    /// Last time a notification went out for this key
    pub last_sent: DateTime<Utc>,
    /// Alerts suppressed since `last_sent`
    pub suppressed: u32,
}

impl AlertStat {
    /// Fresh state for a notification sent at `at`
    pub fn sent_at(at: DateTime<Utc>) -> Self {
        Self {
            last_sent: at,
            suppressed: 0,
        }
    }
}

/// Result of a locked check-and-update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// Key not seen before; entry created
    FirstSeen,
    /// Window elapsed; entry reset. Carries the count suppressed in that window.
    WindowElapsed { suppressed: u32 },
    /// Still inside the window; carries the updated suppressed count
    Suppressed { suppressed: u32 },
}

/// Capacity-bounded LRU map from alert key to [`AlertStat`].
///
/// A single mutex guards the whole map so that lookup, decision and update
/// happen atomically for concurrent alerts with the same key.
pub struct DedupStore {
    stats: Mutex<LruCache<String, AlertStat>>,
}

impl DedupStore {
    /// Create a store holding at most `capacity` keys
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroCapacity)?;
        Ok(Self {
            stats: Mutex::new(LruCache::new(capacity)),
        })
    }

    // Entries are replaced whole; a poisoned lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, LruCache<String, AlertStat>> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get an entry, marking it most recently used
    pub fn lookup(&self, key: &str) -> Option<AlertStat> {
        self.lock().get(key).copied()
    }

    /// Insert or overwrite an entry, evicting the least recently used key
    /// when full
    pub fn upsert(&self, key: impl Into<String>, stat: AlertStat) {
        insert(&mut self.lock(), key.into(), stat);
    }

    /// Look up `key` and apply the dedup decision for an alert seen at `now`,
    /// all under one lock acquisition.
    pub fn check(&self, key: &str, now: DateTime<Utc>, window: Duration) -> DedupOutcome {
        let mut stats = self.lock();
        match stats.get_mut(key) {
            None => {
                insert(&mut stats, key.to_string(), AlertStat::sent_at(now));
                DedupOutcome::FirstSeen
            }
            Some(stat) if now - stat.last_sent >= window => {
                let suppressed = stat.suppressed;
                *stat = AlertStat::sent_at(now);
                DedupOutcome::WindowElapsed { suppressed }
            }
            Some(stat) => {
                stat.suppressed = stat.suppressed.saturating_add(1);
                DedupOutcome::Suppressed {
                    suppressed: stat.suppressed,
                }
            }
        }
    }

    /// Read an entry without touching its recency
    pub fn peek(&self, key: &str) -> Option<AlertStat> {
        self.lock().peek(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }
}

fn insert(stats: &mut LruCache<String, AlertStat>, key: String, stat: AlertStat) {
    // push hands back either the old value for this key or the evicted entry
    if let Some((evicted, _)) = stats.push(key.clone(), stat) {
        if evicted != key {
            debug!("Dedup store full, evicted {}", evicted);
        }
    }
}
