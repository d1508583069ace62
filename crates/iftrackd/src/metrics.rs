//! Prometheus metrics collection for iftrackd

use prometheus::{Counter, Gauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector shared between the ingestion path and the query server
#[derive(Clone)]
pub struct MetricsCollector {
    // Counters
    pub events_processed_total: Counter,
    pub interfaces_added_total: Counter,
    pub interfaces_removed_total: Counter,
    pub events_dropped_total: Counter,
    pub netlink_errors_total: Counter,

    // Gauges
    pub tracked_interfaces: Gauge,

    // Registry for export
    pub registry: Arc<Registry>,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own Prometheus registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let events_processed_total = Counter::with_opts(Opts::new(
            "iftrackd_events_processed_total",
            "Total number of link events processed",
        ))?;
        registry.register(Box::new(events_processed_total.clone()))?;

        let interfaces_added_total = Counter::with_opts(Opts::new(
            "iftrackd_interfaces_added_total",
            "Total number of interfaces added to the registry",
        ))?;
        registry.register(Box::new(interfaces_added_total.clone()))?;

        let interfaces_removed_total = Counter::with_opts(Opts::new(
            "iftrackd_interfaces_removed_total",
            "Total number of interfaces removed from the registry",
        ))?;
        registry.register(Box::new(interfaces_removed_total.clone()))?;

        let events_dropped_total = Counter::with_opts(Opts::new(
            "iftrackd_events_dropped_total",
            "Total number of link events dropped (malformed or registry full)",
        ))?;
        registry.register(Box::new(events_dropped_total.clone()))?;

        let netlink_errors_total = Counter::with_opts(Opts::new(
            "iftrackd_netlink_errors_total",
            "Total number of netlink socket errors",
        ))?;
        registry.register(Box::new(netlink_errors_total.clone()))?;

        let tracked_interfaces = Gauge::with_opts(Opts::new(
            "iftrackd_tracked_interfaces",
            "Current number of tracked interfaces",
        ))?;
        registry.register(Box::new(tracked_interfaces.clone()))?;

        Ok(Self {
            events_processed_total,
            interfaces_added_total,
            interfaces_removed_total,
            events_dropped_total,
            netlink_errors_total,
            tracked_interfaces,
            registry: Arc::new(registry),
        })
    }

    /// Record a processed event that mutated the registry
    pub fn record_event(&self, is_add: bool) {
        self.events_processed_total.inc();
        if is_add {
            self.interfaces_added_total.inc();
        } else {
            self.interfaces_removed_total.inc();
        }
    }

    /// Record a processed event that did not mutate the registry
    pub fn record_noop_event(&self) {
        self.events_processed_total.inc();
    }

    /// Record a dropped event
    pub fn record_dropped(&self) {
        self.events_dropped_total.inc();
    }

    /// Record a netlink error
    pub fn record_netlink_error(&self) {
        self.netlink_errors_total.inc();
    }

    /// Update the tracked-interface gauge
    pub fn set_tracked_interfaces(&self, count: usize) {
        self.tracked_interfaces.set(count as f64);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().unwrap();
        assert_eq!(collector.events_processed_total.get(), 0.0);
        assert_eq!(collector.events_dropped_total.get(), 0.0);
    }

    #[test]
    fn test_record_event() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_event(true);
        assert_eq!(collector.events_processed_total.get(), 1.0);
        assert_eq!(collector.interfaces_added_total.get(), 1.0);

        collector.record_event(false);
        assert_eq!(collector.events_processed_total.get(), 2.0);
        assert_eq!(collector.interfaces_removed_total.get(), 1.0);
    }

    #[test]
    fn test_tracked_interfaces_gauge() {
        let collector = MetricsCollector::new().unwrap();
        collector.set_tracked_interfaces(7);
        assert_eq!(collector.tracked_interfaces.get(), 7.0);
    }
}
