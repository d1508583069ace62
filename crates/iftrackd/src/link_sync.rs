//! LinkSync - wires the netlink subscription to the registry
//!
//! Owns the async netlink socket and drives the ingestor. Creating a
//! `LinkSync` establishes the event subscription; failure here is fatal
//! to startup. Dropping it tears the subscription down.

use crate::error::Result;
use crate::ingest::EventIngestor;
use crate::metrics::MetricsCollector;
use crate::netlink::AsyncNetlinkSocket;
use crate::registry::InterfaceRegistry;
use std::sync::Arc;
use tracing::{info, warn};

/// Link event pump: netlink socket in, registry mutations out
pub struct LinkSync {
    netlink: AsyncNetlinkSocket,
    ingestor: EventIngestor,
    metrics: MetricsCollector,
}

impl LinkSync {
    /// Establish the netlink subscription
    pub fn new(registry: Arc<InterfaceRegistry>, metrics: MetricsCollector) -> Result<Self> {
        let netlink = AsyncNetlinkSocket::new()?;
        info!("Established link event subscription");

        Ok(Self {
            netlink,
            ingestor: EventIngestor::new(registry, metrics.clone()),
            metrics,
        })
    }

    /// Request an initial dump of the link table
    ///
    /// The answers arrive as ordinary link events, so the inventory
    /// converges without special-casing startup.
    pub fn request_dump(&mut self) -> Result<()> {
        info!("Requesting link table dump");
        self.netlink.request_dump()
    }

    /// Receive one batch of events and apply them in delivery order
    ///
    /// A netlink receive error is counted and returned; the caller decides
    /// whether to keep the loop alive (it does, post-startup).
    pub async fn process_events(&mut self) -> Result<usize> {
        let events = match self.netlink.recv_events().await {
            Ok(events) => events,
            Err(e) => {
                self.metrics.record_netlink_error();
                return Err(e);
            }
        };

        let count = events.len();
        for (kind, descriptor) in events {
            self.ingestor.handle_event(kind, &descriptor);
        }
        Ok(count)
    }

    /// Run the event loop until the shutdown signal fires
    pub async fn run(&mut self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Link event loop stopping");
                    return;
                }
                result = self.process_events() => {
                    if let Err(e) = result {
                        warn!(error = %e, "Error processing link events");
                        // Avoid spinning on a persistently failing socket
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    }
                }
            }
        }
    }

    /// Get the netlink socket file descriptor
    pub fn netlink_fd(&self) -> i32 {
        self.netlink.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_linksync_creation() {
        let registry = Arc::new(InterfaceRegistry::new());
        let metrics = MetricsCollector::new().unwrap();
        let sync = LinkSync::new(registry, metrics);
        assert!(sync.is_ok(), "Failed to create LinkSync: {:?}", sync.err());
    }

    #[tokio::test]
    async fn test_linksync_dump_request() {
        let registry = Arc::new(InterfaceRegistry::new());
        let metrics = MetricsCollector::new().unwrap();
        let mut sync = LinkSync::new(registry, metrics).unwrap();
        assert!(sync.request_dump().is_ok());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let registry = Arc::new(InterfaceRegistry::new());
        let metrics = MetricsCollector::new().unwrap();
        let mut sync = LinkSync::new(registry, metrics).unwrap();

        let (tx, rx) = tokio::sync::watch::channel(false);
        let task = tokio::spawn(async move { sync.run(rx).await });

        tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("event loop did not stop")
            .unwrap();
    }
}
