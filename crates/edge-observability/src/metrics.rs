//! Decision and render counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lock-free counters shared by every request handled by one instance.
#[derive(Debug, Default)]
pub struct DecisionMetrics {
    requests: AtomicU64,
    static_assets: AtomicU64,
    stored: AtomicU64,
    no_match: AtomicU64,
    unavailable: AtomicU64,
    renders_started: AtomicU64,
    renders_succeeded: AtomicU64,
    renders_failed: AtomicU64,
    render_timeouts: AtomicU64,
    render_time_us: AtomicU64,
}

impl DecisionMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_static_asset(&self) {
        self.static_assets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stored(&self) {
        self.stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_no_match(&self) {
        self.no_match.fetch_add(1, Ordering::Relaxed);
    }

    /// The store or manifest could not be read.
    pub fn record_unavailable(&self) {
        self.unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_render_started(&self) {
        self.renders_started.fetch_add(1, Ordering::Relaxed);
    }

    /// A render finished, successfully or not, after `elapsed`.
    pub fn record_render(&self, elapsed: Duration, success: bool) {
        let counter = if success {
            &self.renders_succeeded
        } else {
            &self.renders_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.render_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// A render hit the timeout. Counted as a failure too.
    pub fn record_render_timeout(&self, elapsed: Duration) {
        self.render_timeouts.fetch_add(1, Ordering::Relaxed);
        self.record_render(elapsed, false);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            static_assets: self.static_assets.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            no_match: self.no_match.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            renders_started: self.renders_started.load(Ordering::Relaxed),
            renders_succeeded: self.renders_succeeded.load(Ordering::Relaxed),
            renders_failed: self.renders_failed.load(Ordering::Relaxed),
            render_timeouts: self.render_timeouts.load(Ordering::Relaxed),
            render_time_us: self.render_time_us.load(Ordering::Relaxed),
        }
    }
}

/// Serializable counter values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub static_assets: u64,
    pub stored: u64,
    pub no_match: u64,
    pub unavailable: u64,
    pub renders_started: u64,
    pub renders_succeeded: u64,
    pub renders_failed: u64,
    pub render_timeouts: u64,
    /// Cumulative time spent in finished renders (microseconds).
    pub render_time_us: u64,
}

impl MetricsSnapshot {
    /// Mean time of a finished render, if any finished.
    pub fn mean_render_time(&self) -> Option<Duration> {
        let finished = self.renders_succeeded + self.renders_failed;
        (finished > 0).then(|| Duration::from_micros(self.render_time_us / finished))
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = vec![format!("Requests: {}", self.requests)];
        lines.push(format!("  Static assets: {}", self.static_assets));
        lines.push(format!("  Already stored: {}", self.stored));
        lines.push(format!("  No route match: {}", self.no_match));
        if self.unavailable > 0 {
            lines.push(format!("  Store unavailable: {}", self.unavailable));
        }
        lines.push(format!(
            "  Renders: {} started, {} succeeded, {} failed ({} timed out)",
            self.renders_started, self.renders_succeeded, self.renders_failed, self.render_timeouts
        ));
        if let Some(mean) = self.mean_render_time() {
            lines.push(format!(
                "  Mean render time: {}us ({:.2}ms)",
                mean.as_micros(),
                mean.as_micros() as f64 / 1000.0
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = DecisionMetrics::new();
        metrics.record_request();
        metrics.record_request();
        metrics.record_stored();
        metrics.record_render_started();
        metrics.record_render(Duration::from_millis(4), true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests, 2);
        assert_eq!(snapshot.stored, 1);
        assert_eq!(snapshot.renders_succeeded, 1);
        assert_eq!(snapshot.render_time_us, 4_000);
        assert_eq!(snapshot.mean_render_time(), Some(Duration::from_millis(4)));
    }

    #[test]
    fn test_timeout_counts_as_failure() {
        let metrics = DecisionMetrics::new();
        metrics.record_render_timeout(Duration::from_secs(1));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.render_timeouts, 1);
        assert_eq!(snapshot.renders_failed, 1);
        assert_eq!(snapshot.renders_succeeded, 0);
    }

    #[test]
    fn test_snapshot_json_and_summary() {
        let snapshot = MetricsSnapshot {
            requests: 3,
            no_match: 1,
            ..Default::default()
        };
        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json()).unwrap();
        assert_eq!(json["requests"], 3);
        assert_eq!(json["no_match"], 1);

        let summary = snapshot.to_summary();
        assert!(summary.starts_with("Requests: 3"));
        assert!(!summary.contains("Mean render time"));
        assert!(!summary.contains("unavailable"));
    }
}
