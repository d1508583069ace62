//! Core types for interface tracking
//!
//! The raw [`LinkDescriptor`] is what the netlink adapter extracts from a
//! kernel notification; the [`InterfaceRecord`] is the derived row the
//! registry stores and the query surface renders.

use serde::{Deserialize, Serialize};

/// Maximum interface name length (IFNAMSIZ minus the NUL terminator).
///
/// Names and master-device names longer than this are truncated, matching
/// the kernel's own fixed-width name buffers.
pub const MAX_IFNAME_LEN: usize = 15;

/// Sentinel recorded when an interface has no master device
pub const NO_MASTER: &str = "none";

/// MAC address representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Zero MAC address (links without a link-layer address report this)
    pub const ZERO: Self = Self([0, 0, 0, 0, 0, 0]);

    /// Check if this is a zero MAC
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == Self::ZERO.0
    }

    /// Parse MAC from colon-separated string (e.g., "aa:bb:cc:dd:ee:ff")
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return None;
        }
        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl std::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// Derived interface classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceKind {
    /// Hardware-backed device
    Physical,
    /// Software-defined device (veth, bridge, dummy, ...)
    Virtual,
    /// Loopback and similar purely logical devices
    Logical,
}

impl InterfaceKind {
    /// Convert to the display name used in the text report
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceKind::Physical => "Physical",
            InterfaceKind::Virtual => "Virtual",
            InterfaceKind::Logical => "Logical",
        }
    }
}

/// Administrative state of a tracked interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminState {
    /// Interface is operational
    Up,
    /// Interface is not operational
    Down,
}

impl AdminState {
    /// Convert to the display string used in the text report
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminState::Up => "UP",
            AdminState::Down => "DOWN",
        }
    }
}

/// Link lifecycle event kind, as delivered by the event source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEventKind {
    /// Interface came up (first observation or re-activation)
    Up,
    /// Attributes of an already-up interface changed
    Change,
    /// Interface went down or was deleted
    Down,
}

/// Raw interface descriptor extracted from a link notification
///
/// Carries only what the kernel reported; all classification and
/// defaulting happens in the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDescriptor {
    /// Stable kernel-assigned interface index
    pub index: u32,
    /// Current interface name
    pub name: String,
    /// IFF_LOOPBACK capability
    pub loopback: bool,
    /// Live-address-change capability (software-defined devices)
    pub live_addr_change: bool,
    /// Link-layer address, may be all-zero
    pub mac: MacAddress,
    /// VLAN tag if this link is a VLAN sub-interface
    pub vlan_id: Option<u16>,
    /// Maximum transmission unit
    pub mtu: u32,
    /// Negotiated link speed in Mbps, if the device reports one
    pub speed_mbps: Option<u32>,
    /// Whether the interface is operationally running
    pub running: bool,
    /// Name of the master device (bridge, bond, ...), if any
    pub master: Option<String>,
}

/// One tracked interface as stored in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    /// Stable kernel-assigned interface index (primary key)
    pub index: u32,
    /// Interface name at creation time
    pub name: String,
    /// Derived classification
    pub kind: InterfaceKind,
    /// Link-layer address
    pub mac: MacAddress,
    /// VLAN tag, 0 when not a VLAN sub-interface
    pub vlan_id: u16,
    /// Maximum transmission unit
    pub mtu: u32,
    /// Link speed in Mbps, 0 when unknown
    pub speed_mbps: u32,
    /// Administrative state
    pub admin_state: AdminState,
    /// Master device name, "none" when standalone
    pub attached_to: String,
}

/// Truncate an interface name to the bounded length, at a char boundary
pub fn truncate_ifname(name: &str) -> String {
    if name.len() <= MAX_IFNAME_LEN {
        return name.to_string();
    }
    let mut end = MAX_IFNAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_address_display() {
        let mac = MacAddress([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_mac_address_parse() {
        let mac = MacAddress::parse("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(mac.0, [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    }

    #[test]
    fn test_mac_address_parse_invalid() {
        assert!(MacAddress::parse("aa:bb:cc:dd:ee").is_none());
        assert!(MacAddress::parse("zz:bb:cc:dd:ee:ff").is_none());
    }

    #[test]
    fn test_mac_address_zero() {
        assert!(MacAddress::ZERO.is_zero());
        assert!(!MacAddress([1, 0, 0, 0, 0, 0]).is_zero());
    }

    #[test]
    fn test_kind_display_names() {
        assert_eq!(InterfaceKind::Physical.as_str(), "Physical");
        assert_eq!(InterfaceKind::Virtual.as_str(), "Virtual");
        assert_eq!(InterfaceKind::Logical.as_str(), "Logical");
    }

    #[test]
    fn test_admin_state_display() {
        assert_eq!(AdminState::Up.as_str(), "UP");
        assert_eq!(AdminState::Down.as_str(), "DOWN");
    }

    #[test]
    fn test_truncate_short_name_unchanged() {
        assert_eq!(truncate_ifname("eth0"), "eth0");
    }

    #[test]
    fn test_truncate_long_name() {
        let long = "very-long-interface-name";
        let truncated = truncate_ifname(long);
        assert_eq!(truncated.len(), MAX_IFNAME_LEN);
        assert_eq!(truncated, "very-long-inter");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        // Multibyte char straddling the boundary must not split
        let name = "abcdefghijklmn\u{00e9}x";
        let truncated = truncate_ifname(name);
        assert!(truncated.len() <= MAX_IFNAME_LEN);
        assert!(name.starts_with(&truncated));
    }
}
