//! Alert Manager Implementation

use crate::alert::Alert;
use crate::channel::ChannelRouter;
use crate::config::AlertConfig;
use crate::dedup::{DedupOutcome, DedupStore};
use crate::error::{ConfigError, SinkError};
use crate::matcher::RuleSet;
use crate::sink::{NotificationSink, SuppressedCount};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of checking one alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Matched an ignore rule
    Ignored,
    /// Duplicate inside the dedup window
    Suppressed,
    /// Notify, reporting how many were suppressed before it
    Notify(SuppressedCount),
}

impl Decision {
    pub fn should_notify(&self) -> bool {
        matches!(self, Decision::Notify(_))
    }
}

/// Result of one sink call
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub channel: String,
    pub result: Result<(), SinkError>,
}

/// What `process` did with an alert
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    pub decision: Decision,
    /// One entry per matching channel, in channel order
    pub deliveries: Vec<Delivery>,
}

impl ProcessReport {
    pub fn failures(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter().filter(|d| d.result.is_err())
    }
}

/// Alert manager for rule evaluation, deduplication and fan-out.
///
/// Safe to share across tasks; the dedup store carries its own lock and
/// everything else is immutable after construction.
pub struct AlertManager {
    ignored: RuleSet,
    critical: RuleSet,
    router: ChannelRouter,
    store: DedupStore,
    window: Duration,
    site: String,
    dashboard_url: String,
    sink: Arc<dyn NotificationSink>,
}

impl AlertManager {
    /// Create a new alert manager. Any configuration error is fatal.
    pub fn new(config: &AlertConfig, sink: Arc<dyn NotificationSink>) -> Result<Self, ConfigError> {
        config.validate()?;

        let manager = Self {
            ignored: RuleSet::from_configs(&config.ignore_errors, "ignore_errors")?,
            critical: RuleSet::from_configs(&config.critical_errors, "critical_errors")?,
            router: ChannelRouter::from_config(&config.channels)?,
            store: DedupStore::new(config.dedup_capacity)?,
            window: config.window(),
            site: config.site.clone(),
            dashboard_url: config.dashboard_url.clone(),
            sink,
        };

        info!(
            "Alert manager: {} ignore, {} critical, channels [{}], window {}h, capacity {}",
            manager.ignored.len(),
            manager.critical.len(),
            manager.router.names().collect::<Vec<_>>().join(", "),
            config.timespan_hours,
            config.dedup_capacity
        );
        Ok(manager)
    }

    /// Decide whether `alert`, seen at `now`, should notify.
    ///
    /// Ignore rules win over critical rules; critical alerts never touch the
    /// dedup store.
    pub fn check(&self, alert: &Alert, now: DateTime<Utc>) -> Decision {
        if self.ignored.matches(alert) {
            debug!("Alert ignored: {}/{}", alert.app, alert.error_code);
            return Decision::Ignored;
        }
        if self.critical.matches(alert) {
            debug!("Critical alert, skipping dedup: {}/{}", alert.app, alert.error_code);
            return Decision::Notify(SuppressedCount::NoContext);
        }

        let key = alert.dedup_key();
        match self.store.check(&key, now, self.window) {
            DedupOutcome::FirstSeen => Decision::Notify(SuppressedCount::NoContext),
            DedupOutcome::WindowElapsed { suppressed } => {
                Decision::Notify(SuppressedCount::Since(suppressed))
            }
            DedupOutcome::Suppressed { suppressed } => {
                debug!("Alert suppressed: {} (count: {})", key, suppressed);
                Decision::Suppressed
            }
        }
    }

    /// Check `alert` and, if it should notify, deliver it to every matching
    /// channel.
    ///
    /// Each channel is attempted regardless of earlier failures; results are
    /// returned per channel.
    pub async fn process(&self, alert: &Alert, now: DateTime<Utc>) -> ProcessReport {
        let decision = self.check(alert, now);
        let Decision::Notify(suppressed) = decision else {
            return ProcessReport {
                decision,
                deliveries: Vec::new(),
            };
        };

        let alert = self.enrich(alert);
        let mut deliveries = Vec::new();
        for channel in self.router.route(&alert) {
            let result = self.sink.notify(channel.name(), &alert, suppressed, now).await;
            match &result {
                Ok(()) => info!(
                    "Alert sent to {}: {} (suppressed: {})",
                    channel.name(),
                    alert.dedup_key(),
                    suppressed
                ),
                Err(e) => warn!("Alert delivery to {} failed: {}", channel.name(), e),
            }
            deliveries.push(Delivery {
                channel: channel.name().to_string(),
                result,
            });
        }

        if deliveries.is_empty() {
            debug!("No channel matched alert {}", alert.dedup_key());
        }

        ProcessReport {
            decision,
            deliveries,
        }
    }

    fn enrich(&self, alert: &Alert) -> Alert {
        let mut alert = alert.clone();
        alert.site = Some(self.site.clone());
        alert.dashboard_url = Some(self.dashboard_url.replace("{index}", &alert.index));
        alert
    }

    /// The dedup store, for diagnostics
    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    pub fn router(&self) -> &ChannelRouter {
        &self.router
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Severity;
    use crate::config::MatcherConfig;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    type Call = (String, Alert, SuppressedCount, DateTime<Utc>);

    /// Records every call; fails for channels listed in `failing`, or for
    /// every channel when `down`
    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<Call>>,
        failing: Vec<String>,
        down: bool,
    }

    impl RecordingSink {
        fn failing_on(channel: &str) -> Self {
            Self {
                failing: vec![channel.to_string()],
                ..Default::default()
            }
        }

        fn down() -> Self {
            Self {
                down: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify(
            &self,
            channel: &str,
            alert: &Alert,
            suppressed: SuppressedCount,
            at: DateTime<Utc>,
        ) -> Result<(), SinkError> {
            self.calls
                .lock()
                .unwrap()
                .push((channel.to_string(), alert.clone(), suppressed, at));
            if self.down {
                return Err(SinkError::Unavailable("transport down".to_string()));
            }
            if self.failing.iter().any(|c| c == channel) {
                return Err(SinkError::Delivery {
                    channel: channel.to_string(),
                    reason: "rejected".to_string(),
                });
            }
            Ok(())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn alert(app: &str, severity: Severity, code: &str, index: &str) -> Alert {
        Alert::new(app, severity, code, index)
    }

    fn example_config() -> AlertConfig {
        let mut config = AlertConfig {
            ignore_errors: vec![MatcherConfig::any()
                .apps(["site-a"])
                .error_codes(["NOT_FOUND"])
                .severity(Severity::Warn)],
            critical_errors: vec![MatcherConfig::any()
                .error_codes(["CRITICAL", "SLOW_QUERY"])
                .severity(Severity::Error)],
            timespan_hours: 4,
            site: "prod".to_string(),
            dashboard_url: "http://kibana:5601/app/{index}".to_string(),
            ..Default::default()
        };
        config
            .channels
            .insert("errors".to_string(), MatcherConfig::any().severity(Severity::Error));
        config
    }

    fn manager(config: &AlertConfig, sink: &Arc<RecordingSink>) -> AlertManager {
        AlertManager::new(config, sink.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_ignored_alert() {
        let sink = Arc::new(RecordingSink::default());
        let manager = manager(&example_config(), &sink);

        let report = manager
            .process(&alert("site-a", Severity::Warn, "NOT_FOUND", "trace"), t0())
            .await;

        assert_eq!(report.decision, Decision::Ignored);
        assert!(sink.calls().is_empty());
        assert!(manager.store().is_empty());
    }

    #[tokio::test]
    async fn test_critical_bypasses_store() {
        let sink = Arc::new(RecordingSink::default());
        let manager = manager(&example_config(), &sink);
        let critical = alert("site-a", Severity::Error, "CRITICAL", "trace");

        for minutes in [0, 1, 2] {
            let report = manager.process(&critical, t0() + Duration::minutes(minutes)).await;
            assert_eq!(report.decision, Decision::Notify(SuppressedCount::NoContext));
        }

        let calls = sink.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(channel, _, count, _)| {
            channel == "errors" && *count == SuppressedCount::NoContext
        }));
        assert!(manager.store().is_empty());
    }

    #[tokio::test]
    async fn test_dedup_window_example() {
        let sink = Arc::new(RecordingSink::default());
        let manager = manager(&example_config(), &sink);
        let timeout = alert("site-a", Severity::Error, "TIMEOUT", "trace");
        let key = timeout.dedup_key();

        let report = manager.process(&timeout, t0()).await;
        assert_eq!(report.decision, Decision::Notify(SuppressedCount::NoContext));
        assert_eq!(sink.calls().len(), 1);

        let report = manager.process(&timeout, t0() + Duration::minutes(30)).await;
        assert_eq!(report.decision, Decision::Suppressed);
        assert!(report.deliveries.is_empty());
        assert_eq!(sink.calls().len(), 1);
        assert_eq!(manager.store().peek(&key).unwrap().suppressed, 1);

        let resend = t0() + Duration::hours(4) + Duration::minutes(1);
        let report = manager.process(&timeout, resend).await;
        assert_eq!(report.decision, Decision::Notify(SuppressedCount::Since(1)));

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].2, SuppressedCount::Since(1));
        assert_eq!(calls[1].3, resend);
        assert_eq!(manager.store().peek(&key).unwrap().suppressed, 0);
        assert_eq!(manager.store().peek(&key).unwrap().last_sent, resend);
    }

    #[test]
    fn test_check_window_boundary_is_inclusive() {
        let sink = Arc::new(RecordingSink::default());
        let manager = manager(&example_config(), &sink);
        let error = alert("website", Severity::Error, "ERROR", "trace");

        assert_eq!(manager.check(&error, t0()), Decision::Notify(SuppressedCount::NoContext));
        assert_eq!(manager.check(&error, t0() + Duration::minutes(30)), Decision::Suppressed);
        assert_eq!(
            manager.check(&error, t0() + Duration::hours(4)),
            Decision::Notify(SuppressedCount::Since(1))
        );
        // check never calls the sink
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_first_warning_notifies() {
        let sink = Arc::new(RecordingSink::default());
        let manager = manager(&example_config(), &sink);

        // SLOW_QUERY is only critical as ERROR; as WARN it goes through dedup
        let warn = alert("website", Severity::Warn, "SLOW_QUERY", "trace");
        assert_eq!(manager.check(&warn, t0()), Decision::Notify(SuppressedCount::NoContext));
        assert!(manager.store().contains(&warn.dedup_key()));
    }

    #[tokio::test]
    async fn test_enrichment_and_fan_out() {
        let mut config = example_config();
        config.channels.insert(
            "product".to_string(),
            MatcherConfig::any().apps(["website"]).error_codes(["PRODUCT_ERROR"]),
        );
        let sink = Arc::new(RecordingSink::default());
        let manager = manager(&config, &sink);
        let original = alert("website", Severity::Error, "PRODUCT_ERROR", "event");

        let report = manager.process(&original, t0()).await;
        assert_eq!(report.deliveries.len(), 2);

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "errors");
        assert_eq!(calls[1].0, "product");
        assert_eq!(calls[0].1, calls[1].1);
        assert_eq!(calls[0].2, calls[1].2);
        assert_eq!(calls[0].3, calls[1].3);

        let sent = &calls[0].1;
        assert_eq!(sent.site.as_deref(), Some("prod"));
        assert_eq!(sent.dashboard_url.as_deref(), Some("http://kibana:5601/app/event"));
        // caller's alert is left untouched
        assert!(original.site.is_none());
    }

    #[tokio::test]
    async fn test_no_matching_channel_still_updates_store() {
        let sink = Arc::new(RecordingSink::default());
        let manager = manager(&example_config(), &sink);
        let warn = alert("website", Severity::Warn, "DISK_FULL", "trace");

        let report = manager.process(&warn, t0()).await;
        assert!(report.decision.should_notify());
        assert!(report.deliveries.is_empty());
        assert!(sink.calls().is_empty());
        assert!(manager.store().contains(&warn.dedup_key()));
    }

    #[tokio::test]
    async fn test_channel_failure_is_isolated() {
        let mut config = example_config();
        config.channels.insert("all".to_string(), MatcherConfig::any());
        let sink = Arc::new(RecordingSink::failing_on("all"));
        let manager = manager(&config, &sink);

        let report = manager
            .process(&alert("website", Severity::Error, "TIMEOUT", "trace"), t0())
            .await;

        assert_eq!(sink.calls().len(), 2);
        let failed: Vec<_> = report.failures().map(|d| d.channel.as_str()).collect();
        assert_eq!(failed, vec!["all"]);
        let errors = report.deliveries.iter().find(|d| d.channel == "errors").unwrap();
        assert!(errors.result.is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_sink_reported_per_channel() {
        let mut config = example_config();
        config.channels.insert("all".to_string(), MatcherConfig::any());
        let sink = Arc::new(RecordingSink::down());
        let manager = manager(&config, &sink);
        let error = alert("website", Severity::Error, "TIMEOUT", "trace");

        let report = manager.process(&error, t0()).await;

        assert_eq!(report.decision, Decision::Notify(SuppressedCount::NoContext));
        assert_eq!(sink.calls().len(), 2);
        let failed: Vec<_> = report.failures().map(|d| d.channel.as_str()).collect();
        assert_eq!(failed, vec!["all", "errors"]);
        for delivery in &report.deliveries {
            assert_eq!(
                delivery.result,
                Err(SinkError::Unavailable("transport down".to_string()))
            );
        }

        // the send was recorded even though nothing was delivered
        let report = manager.process(&error, t0() + Duration::minutes(5)).await;
        assert_eq!(report.decision, Decision::Suppressed);
        assert_eq!(sink.calls().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicates_notify_once() {
        let sink = Arc::new(RecordingSink::default());
        let manager = Arc::new(manager(&example_config(), &sink));
        let timeout = alert("website", Severity::Error, "TIMEOUT", "trace");

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let manager = manager.clone();
                let timeout = timeout.clone();
                tokio::spawn(async move { manager.process(&timeout, t0()).await })
            })
            .collect();

        let mut notified = 0;
        for handle in handles {
            if handle.await.unwrap().decision.should_notify() {
                notified += 1;
            }
        }

        assert_eq!(notified, 1);
        assert_eq!(sink.calls().len(), 1);
        assert_eq!(manager.store().peek(&timeout.dedup_key()).unwrap().suppressed, 31);
    }

    #[test]
    fn test_rejects_bad_config() {
        let sink: Arc<dyn NotificationSink> = Arc::new(RecordingSink::default());

        let config = AlertConfig {
            timespan_hours: 0,
            ..example_config()
        };
        assert!(matches!(
            AlertManager::new(&config, sink.clone()),
            Err(ConfigError::InvalidWindow(0))
        ));

        let config = AlertConfig {
            critical_errors: vec![MatcherConfig::any().indices([""])],
            ..example_config()
        };
        assert!(matches!(
            AlertManager::new(&config, sink),
            Err(ConfigError::BlankRuleEntry { .. })
        ));
    }
}
