//! Event ingestion: maps link events onto registry mutations
//!
//! Events are applied strictly in delivery order. All dedup/no-op logic
//! lives in the registry; a failed registry call is logged and the next
//! event is processed, one bad event never halts ingestion.

use crate::metrics::MetricsCollector;
use crate::registry::InterfaceRegistry;
use crate::types::{LinkDescriptor, LinkEventKind};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Adapts the external event stream into registry calls
pub struct EventIngestor {
    registry: Arc<InterfaceRegistry>,
    metrics: MetricsCollector,
}

impl EventIngestor {
    /// Create an ingestor writing into the shared registry
    pub fn new(registry: Arc<InterfaceRegistry>, metrics: MetricsCollector) -> Self {
        Self { registry, metrics }
    }

    /// Apply a single link event to the registry
    pub fn handle_event(&self, kind: LinkEventKind, descriptor: &LinkDescriptor) {
        match kind {
            LinkEventKind::Up | LinkEventKind::Change => {
                match self.registry.upsert(descriptor.index, descriptor) {
                    Ok(true) => {
                        info!(
                            index = descriptor.index,
                            name = %descriptor.name,
                            "Tracking interface"
                        );
                        self.metrics.record_event(true);
                    }
                    Ok(false) => {
                        debug!(index = descriptor.index, "Interface already tracked");
                        self.metrics.record_noop_event();
                    }
                    Err(e) => {
                        warn!(
                            index = descriptor.index,
                            name = %descriptor.name,
                            error = %e,
                            "Dropping link event"
                        );
                        self.metrics.record_dropped();
                    }
                }
            }
            LinkEventKind::Down => {
                if self.registry.remove(descriptor.index) {
                    info!(
                        index = descriptor.index,
                        name = %descriptor.name,
                        "Untracked interface"
                    );
                    self.metrics.record_event(false);
                } else {
                    debug!(index = descriptor.index, "Down event for untracked interface");
                    self.metrics.record_noop_event();
                }
            }
        }
        self.metrics.set_tracked_interfaces(self.registry.len());
    }
}
