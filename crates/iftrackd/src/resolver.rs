//! Attribute derivation for raw link descriptors
//!
//! Pure functions: classification and display attributes depend only on
//! the descriptor passed in. Missing optional data degrades to documented
//! defaults (speed 0, "none" master) and is never an error.

use crate::types::{truncate_ifname, InterfaceKind, LinkDescriptor, NO_MASTER};

/// Attributes derived from a [`LinkDescriptor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttributes {
    /// Derived classification
    pub kind: InterfaceKind,
    /// VLAN tag, 0 when not a VLAN sub-interface
    pub vlan_id: u16,
    /// Link speed in Mbps, 0 when unknown
    pub speed_mbps: u32,
    /// Master device name, "none" when standalone
    pub attached_to: String,
}

/// Classify an interface from its capability flags
///
/// Loopback is checked before the live-address-change capability: loopback
/// devices also advertise software-device capabilities and would otherwise
/// be misclassified as Virtual.
pub fn classify(descriptor: &LinkDescriptor) -> InterfaceKind {
    if descriptor.loopback {
        InterfaceKind::Logical
    } else if descriptor.live_addr_change {
        InterfaceKind::Virtual
    } else {
        InterfaceKind::Physical
    }
}

/// Derive classification and display attributes from a raw descriptor
pub fn resolve(descriptor: &LinkDescriptor) -> ResolvedAttributes {
    ResolvedAttributes {
        kind: classify(descriptor),
        vlan_id: descriptor.vlan_id.unwrap_or(0),
        speed_mbps: descriptor.speed_mbps.unwrap_or(0),
        attached_to: descriptor
            .master
            .as_deref()
            .map(truncate_ifname)
            .unwrap_or_else(|| NO_MASTER.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MacAddress;

    fn make_descriptor() -> LinkDescriptor {
        LinkDescriptor {
            index: 2,
            name: "eth0".to_string(),
            loopback: false,
            live_addr_change: false,
            mac: MacAddress([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]),
            vlan_id: None,
            mtu: 1500,
            speed_mbps: Some(1000),
            running: true,
            master: None,
        }
    }

    #[test]
    fn test_classify_physical() {
        let desc = make_descriptor();
        assert_eq!(classify(&desc), InterfaceKind::Physical);
    }

    #[test]
    fn test_classify_virtual() {
        let mut desc = make_descriptor();
        desc.live_addr_change = true;
        assert_eq!(classify(&desc), InterfaceKind::Virtual);
    }

    #[test]
    fn test_classify_loopback_beats_virtual() {
        // Loopback wins regardless of other capability flags
        let mut desc = make_descriptor();
        desc.loopback = true;
        desc.live_addr_change = true;
        assert_eq!(classify(&desc), InterfaceKind::Logical);
    }

    #[test]
    fn test_resolve_defaults() {
        let mut desc = make_descriptor();
        desc.vlan_id = None;
        desc.speed_mbps = None;
        desc.master = None;

        let attrs = resolve(&desc);
        assert_eq!(attrs.vlan_id, 0);
        assert_eq!(attrs.speed_mbps, 0);
        assert_eq!(attrs.attached_to, "none");
    }

    #[test]
    fn test_resolve_vlan_and_master() {
        let mut desc = make_descriptor();
        desc.vlan_id = Some(100);
        desc.master = Some("br0".to_string());

        let attrs = resolve(&desc);
        assert_eq!(attrs.vlan_id, 100);
        assert_eq!(attrs.attached_to, "br0");
    }

    #[test]
    fn test_resolve_truncates_master_name() {
        let mut desc = make_descriptor();
        desc.master = Some("bridge-with-a-very-long-name".to_string());

        let attrs = resolve(&desc);
        assert_eq!(attrs.attached_to.len(), crate::types::MAX_IFNAME_LEN);
    }
}
