//! The event-driven interface registry
//!
//! Concurrency-safe keyed store of [`InterfaceRecord`]s. One logical
//! writer (event ingestion) and any number of readers (queries) share a
//! registry instance through an `Arc`; all mutual exclusion lives here,
//! the event source is not assumed to serialize calls.

use crate::error::{IftrackError, Result};
use crate::resolver;
use crate::types::{truncate_ifname, AdminState, InterfaceRecord, LinkDescriptor};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Default capacity bound for tracked interfaces
///
/// Upserts beyond this bound fail with [`IftrackError::RegistryFull`]; the
/// event is dropped and the interface stays untracked until its next event.
pub const MAX_TRACKED_INTERFACES: usize = 4096;

/// Concurrency-safe inventory of tracked interfaces, keyed by ifindex
///
/// A record exists iff the interface has been observed up/changed at least
/// once and has not since been observed down. The interface name is not a
/// key; interfaces can be renamed, the index is stable.
pub struct InterfaceRegistry {
    inner: RwLock<HashMap<u32, InterfaceRecord>>,
    capacity: usize,
}

impl InterfaceRegistry {
    /// Create a registry with the default capacity bound
    pub fn new() -> Self {
        Self::with_capacity(MAX_TRACKED_INTERFACES)
    }

    /// Create a registry with an explicit capacity bound
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Insert a record for `index` derived from the descriptor.
    ///
    /// If a record already exists for `index` this is a no-op: no field is
    /// refreshed, not even administrative state or MTU. Renames and MTU
    /// changes only take effect after a down/up cycle; see DESIGN.md before
    /// changing this contract.
    ///
    /// Returns `Ok(true)` if a record was inserted, `Ok(false)` on the
    /// existing-key no-op.
    pub fn upsert(&self, index: u32, descriptor: &LinkDescriptor) -> Result<bool> {
        let mut map = self.inner.write();

        if map.contains_key(&index) {
            debug!(index, "Interface already tracked, skipping update");
            return Ok(false);
        }

        if map.len() >= self.capacity {
            return Err(IftrackError::RegistryFull {
                capacity: self.capacity,
            });
        }

        // Record construction is pure and cheap, so holding the write lock
        // across it keeps insertion atomic from any reader's point of view.
        let attrs = resolver::resolve(descriptor);
        let record = InterfaceRecord {
            index,
            name: truncate_ifname(&descriptor.name),
            kind: attrs.kind,
            mac: descriptor.mac,
            vlan_id: attrs.vlan_id,
            mtu: descriptor.mtu,
            speed_mbps: attrs.speed_mbps,
            admin_state: if descriptor.running {
                AdminState::Up
            } else {
                AdminState::Down
            },
            attached_to: attrs.attached_to,
        };
        map.insert(index, record);
        Ok(true)
    }

    /// Remove the record for `index`, if present.
    ///
    /// Removal of an absent record is a defined no-op, never an error.
    /// Returns whether a record was removed.
    pub fn remove(&self, index: u32) -> bool {
        self.inner.write().remove(&index).is_some()
    }

    /// Point-in-time copy of all current records, sorted by index.
    ///
    /// The copy is taken under the read lock, so a caller never sees a
    /// half-created or half-removed record and needs no further
    /// synchronization to render the full listing.
    pub fn snapshot(&self) -> Vec<InterfaceRecord> {
        let mut records: Vec<InterfaceRecord> = self.inner.read().values().cloned().collect();
        records.sort_unstable_by_key(|r| r.index);
        records
    }

    /// Whether a record exists for `index`
    pub fn contains(&self, index: u32) -> bool {
        self.inner.read().contains_key(&index)
    }

    /// Number of tracked interfaces
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl Default for InterfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
