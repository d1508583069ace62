//! Netlink socket handling for link events
//!
//! Subscribes to RTNLGRP_LINK and turns RTM_NEWLINK/RTM_DELLINK messages
//! into `(LinkEventKind, LinkDescriptor)` pairs. The async wrapper
//! integrates the socket with tokio's epoll loop via `AsyncFd`.

#[cfg(target_os = "linux")]
mod linux {
    use crate::error::{IftrackError, Result};
    use crate::types::{LinkDescriptor, LinkEventKind, MacAddress};
    use netlink_packet_core::{
        NetlinkHeader, NetlinkMessage, NetlinkPayload, NLM_F_DUMP, NLM_F_REQUEST,
    };
    use netlink_packet_route::link::{
        InfoData, InfoKind, InfoVlan, LinkAttribute, LinkFlags, LinkInfo, LinkMessage,
    };
    use netlink_packet_route::RouteNetlinkMessage;
    use netlink_sys::{protocols::NETLINK_ROUTE, Socket, SocketAddr};
    use std::collections::HashMap;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
    use tokio::io::unix::AsyncFd;
    use tracing::{debug, trace, warn};

    /// Netlink group for link notifications (RTNLGRP_LINK = 1)
    const RTNLGRP_LINK: u32 = 1;

    /// Socket receive buffer size (1MB) for handling burst loads
    const SOCKET_RECV_BUFFER_SIZE: usize = 1024 * 1024;

    /// Default capacity for the pre-allocated event buffer
    const DEFAULT_EVENT_CAPACITY: usize = 64;

    /// Interface name cache, used to resolve master-device indices
    #[derive(Debug, Default)]
    pub struct InterfaceCache {
        cache: HashMap<u32, String>,
    }

    impl InterfaceCache {
        /// Look up interface name by index
        pub fn get(&self, ifindex: u32) -> Option<&str> {
            self.cache.get(&ifindex).map(|s| s.as_str())
        }

        /// Add interface to cache
        pub fn insert(&mut self, ifindex: u32, name: String) {
            self.cache.insert(ifindex, name);
        }

        /// Resolve interface name, querying the system if not cached
        pub fn resolve(&mut self, ifindex: u32) -> Option<&str> {
            if !self.cache.contains_key(&ifindex) {
                match nix::net::if_::if_indextoname(ifindex) {
                    Ok(name) => {
                        let name_str = name.to_string_lossy().into_owned();
                        self.cache.insert(ifindex, name_str);
                    }
                    Err(_) => return None,
                }
            }
            self.cache.get(&ifindex).map(|s| s.as_str())
        }
    }

    /// Netlink socket for receiving link events
    pub struct NetlinkSocket {
        socket: Socket,
        /// Pre-allocated receive buffer (reused across calls)
        buffer: Vec<u8>,
        /// Pre-allocated event buffer (cleared and reused)
        events_buffer: Vec<(LinkEventKind, LinkDescriptor)>,
        interface_cache: InterfaceCache,
    }

    impl NetlinkSocket {
        /// Create and bind a new netlink socket subscribed to link events
        pub fn new() -> Result<Self> {
            let mut socket = Socket::new(NETLINK_ROUTE)
                .map_err(|e| IftrackError::Netlink(format!("Failed to create socket: {}", e)))?;

            // Subscribe to link events
            let groups = 1 << (RTNLGRP_LINK - 1);
            let addr = SocketAddr::new(0, groups);
            socket
                .bind(&addr)
                .map_err(|e| IftrackError::Netlink(format!("Failed to bind socket: {}", e)))?;

            debug!("Netlink socket bound to RTNLGRP_LINK");

            let nl_socket = Self {
                socket,
                buffer: vec![0u8; 65536],
                events_buffer: Vec::with_capacity(DEFAULT_EVENT_CAPACITY),
                interface_cache: InterfaceCache::default(),
            };

            // Tune socket for high-throughput scenarios
            nl_socket.tune_socket()?;

            Ok(nl_socket)
        }

        /// Set socket to non-blocking mode for async operation
        fn set_nonblocking(&self) -> Result<()> {
            let fd = self.socket.as_raw_fd();
            unsafe {
                let flags = libc::fcntl(fd, libc::F_GETFL);
                if flags < 0 {
                    return Err(IftrackError::Netlink("Failed to get socket flags".into()));
                }
                if libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
                    return Err(IftrackError::Netlink(
                        "Failed to set non-blocking mode".into(),
                    ));
                }
            }
            Ok(())
        }

        /// Tune socket buffer settings for high-throughput scenarios
        fn tune_socket(&self) -> Result<()> {
            let fd = self.socket.as_raw_fd();

            unsafe {
                let size = SOCKET_RECV_BUFFER_SIZE as libc::c_int;
                let ret = libc::setsockopt(
                    fd,
                    libc::SOL_SOCKET,
                    libc::SO_RCVBUF,
                    &size as *const _ as *const libc::c_void,
                    std::mem::size_of::<libc::c_int>() as libc::socklen_t,
                );
                if ret < 0 {
                    warn!("Failed to set SO_RCVBUF, using default buffer size");
                } else {
                    debug!(size = SOCKET_RECV_BUFFER_SIZE, "Set socket receive buffer");
                }

                // Prevent ENOBUFS errors under event bursts
                let enable: libc::c_int = 1;
                let ret = libc::setsockopt(
                    fd,
                    libc::SOL_NETLINK,
                    libc::NETLINK_NO_ENOBUFS,
                    &enable as *const _ as *const libc::c_void,
                    std::mem::size_of::<libc::c_int>() as libc::socklen_t,
                );
                if ret < 0 {
                    warn!("Failed to set NETLINK_NO_ENOBUFS");
                } else {
                    debug!("Enabled NETLINK_NO_ENOBUFS");
                }
            }

            Ok(())
        }

        /// Get the raw file descriptor for async polling
        pub fn as_raw_fd(&self) -> i32 {
            self.socket.as_raw_fd()
        }

        /// Request a dump of the current link table
        ///
        /// The kernel answers with one RTM_NEWLINK per interface, so the
        /// inventory converges at startup without waiting for churn.
        pub fn request_dump(&mut self) -> Result<()> {
            let mut header = NetlinkHeader::default();
            header.flags = NLM_F_REQUEST | NLM_F_DUMP;

            let msg = LinkMessage::default();
            let payload = RouteNetlinkMessage::GetLink(msg);
            let mut packet = NetlinkMessage::new(header, NetlinkPayload::InnerMessage(payload));
            packet.finalize();

            let bytes = packet.buffer_len();
            let mut buf = vec![0u8; bytes];
            packet.serialize(&mut buf);

            self.socket
                .send(&buf, 0)
                .map_err(|e| IftrackError::Netlink(format!("Failed to send dump request: {}", e)))?;

            debug!("Requested link table dump");
            Ok(())
        }

        /// Receive and parse link events (blocking)
        pub fn receive_events(&mut self) -> Result<Vec<(LinkEventKind, LinkDescriptor)>> {
            let len = self
                .socket
                .recv(&mut &mut self.buffer[..], 0)
                .map_err(|e| IftrackError::Netlink(format!("Failed to receive: {}", e)))?;

            self.parse_buffer(len)
        }

        /// Receive events with non-blocking semantics
        ///
        /// Returns Ok(None) if no data is available (EAGAIN/EWOULDBLOCK)
        pub fn try_receive_events(&mut self) -> Result<Option<Vec<(LinkEventKind, LinkDescriptor)>>> {
            match self.socket.recv(&mut &mut self.buffer[..], libc::MSG_DONTWAIT) {
                Ok(len) => Ok(Some(self.parse_buffer(len)?)),
                Err(e) => {
                    let errno = std::io::Error::last_os_error();
                    if errno.raw_os_error() == Some(libc::EAGAIN)
                        || errno.raw_os_error() == Some(libc::EWOULDBLOCK)
                    {
                        Ok(None)
                    } else {
                        Err(IftrackError::Netlink(format!("Failed to receive: {}", e)))
                    }
                }
            }
        }

        /// Parse the receive buffer into link events
        fn parse_buffer(&mut self, len: usize) -> Result<Vec<(LinkEventKind, LinkDescriptor)>> {
            self.events_buffer.clear();

            let mut offset = 0;

            while offset < len {
                let msg =
                    match NetlinkMessage::<RouteNetlinkMessage>::deserialize(&self.buffer[offset..len])
                    {
                        Ok(msg) => msg,
                        Err(e) => {
                            // A corrupt header costs the rest of this
                            // datagram; events parsed before it survive
                            warn!(error = %e, "Failed to parse message, discarding datagram remainder");
                            break;
                        }
                    };

                if msg.header.length == 0 {
                    warn!("Zero-length netlink header, discarding datagram remainder");
                    break;
                }
                offset += msg.header.length as usize;
                // Align to 4 bytes (netlink alignment requirement)
                offset = (offset + 3) & !3;

                match self.parse_link_message(&msg) {
                    Ok(Some(event)) => self.events_buffer.push(event),
                    Ok(None) => {}
                    Err(e) => {
                        // Malformed notification: drop it, keep the stream alive
                        warn!(error = %e, "Dropping malformed link message");
                    }
                }
            }

            trace!(count = self.events_buffer.len(), "Received link events");

            Ok(std::mem::take(&mut self.events_buffer))
        }

        /// Parse a netlink message into a link event
        ///
        /// Event mapping: DelLink and administratively-down NewLink map
        /// to Down, NewLink with IFF_UP maps to Up when the change mask
        /// is empty and Change when it reports modified flags.
        fn parse_link_message(
            &mut self,
            msg: &NetlinkMessage<RouteNetlinkMessage>,
        ) -> Result<Option<(LinkEventKind, LinkDescriptor)>> {
            let (is_del, link_msg) = match &msg.payload {
                NetlinkPayload::InnerMessage(RouteNetlinkMessage::NewLink(l)) => (false, l),
                NetlinkPayload::InnerMessage(RouteNetlinkMessage::DelLink(l)) => (true, l),
                _ => return Ok(None),
            };

            let index = link_msg.header.index;
            let flags = link_msg.header.flags;

            let mut name: Option<String> = None;
            let mut mac = MacAddress::ZERO;
            let mut mtu = 0u32;
            let mut vlan_id: Option<u16> = None;
            let mut has_link_info = false;
            let mut master_index: Option<u32> = None;

            for attr in &link_msg.attributes {
                match attr {
                    LinkAttribute::IfName(ifname) => name = Some(ifname.clone()),
                    LinkAttribute::Address(bytes) => {
                        if bytes.len() == 6 {
                            let mut arr = [0u8; 6];
                            arr.copy_from_slice(bytes);
                            mac = MacAddress(arr);
                        }
                    }
                    LinkAttribute::Mtu(m) => mtu = *m,
                    LinkAttribute::Controller(idx) => master_index = Some(*idx),
                    LinkAttribute::LinkInfo(infos) => {
                        has_link_info = true;
                        vlan_id = extract_vlan_id(infos);
                    }
                    _ => {}
                }
            }

            let name = match name {
                Some(n) => n,
                None => match self.interface_cache.get(index) {
                    Some(cached) => cached.to_string(),
                    None if is_del => {
                        // Index alone is enough to untrack
                        String::new()
                    }
                    None => {
                        return Err(IftrackError::MalformedDescriptor(format!(
                            "link message for index {} has no name",
                            index
                        )));
                    }
                },
            };

            if !name.is_empty() {
                self.interface_cache.insert(index, name.clone());
            }

            let kind = if is_del {
                LinkEventKind::Down
            } else if !flags.contains(LinkFlags::Up) {
                // Administrative down arrives as a NewLink without IFF_UP
                LinkEventKind::Down
            } else if link_msg.header.change_mask.is_empty() {
                LinkEventKind::Up
            } else {
                LinkEventKind::Change
            };

            let master = master_index.and_then(|idx| {
                self.interface_cache.resolve(idx).map(|n| n.to_string())
            });

            // priv_flags are not visible over rtnetlink; a link-info kind
            // marks the device as software-created
            let loopback = flags.contains(LinkFlags::Loopback);
            let live_addr_change = has_link_info && !loopback;

            let speed_mbps = if kind == LinkEventKind::Down {
                None
            } else {
                read_link_speed(&name)
            };

            let descriptor = LinkDescriptor {
                index,
                name,
                loopback,
                live_addr_change,
                mac,
                vlan_id,
                mtu,
                speed_mbps,
                running: flags.contains(LinkFlags::Running),
                master,
            };

            debug!(
                kind = ?kind,
                index = descriptor.index,
                name = %descriptor.name,
                mtu = descriptor.mtu,
                "Parsed link event"
            );

            Ok(Some((kind, descriptor)))
        }
    }

    /// Pull a VLAN id out of IFLA_LINKINFO, if this link is a VLAN device
    fn extract_vlan_id(infos: &[LinkInfo]) -> Option<u16> {
        let is_vlan = infos
            .iter()
            .any(|info| matches!(info, LinkInfo::Kind(InfoKind::Vlan)));
        if !is_vlan {
            return None;
        }
        for info in infos {
            if let LinkInfo::Data(InfoData::Vlan(vlan_attrs)) = info {
                for attr in vlan_attrs {
                    if let InfoVlan::Id(id) = attr {
                        return Some(*id);
                    }
                }
            }
        }
        None
    }

    /// Read the negotiated link speed from sysfs
    ///
    /// Devices without a negotiated speed report -1 or have no readable
    /// attribute, both of which degrade to unknown (0 in the report).
    fn read_link_speed(name: &str) -> Option<u32> {
        let path = format!("/sys/class/net/{}/speed", name);
        let raw = std::fs::read_to_string(path).ok()?;
        parse_speed_value(&raw)
    }

    /// Parse a sysfs speed value; negative means unknown
    fn parse_speed_value(raw: &str) -> Option<u32> {
        let speed: i64 = raw.trim().parse().ok()?;
        u32::try_from(speed).ok()
    }

    /// Async netlink socket wrapper using tokio's epoll integration
    pub struct AsyncNetlinkSocket {
        inner: AsyncFd<OwnedFd>,
        socket: NetlinkSocket,
    }

    impl AsyncNetlinkSocket {
        /// Create a new async netlink socket
        pub fn new() -> Result<Self> {
            let socket = NetlinkSocket::new()?;

            // Set non-blocking for async operation
            socket.set_nonblocking()?;

            // Create owned fd for AsyncFd (dup so the Socket retains ownership)
            let fd = socket.as_raw_fd();
            let owned_fd = unsafe {
                let new_fd = libc::dup(fd);
                if new_fd < 0 {
                    return Err(IftrackError::Netlink("Failed to dup fd".into()));
                }
                OwnedFd::from_raw_fd(new_fd)
            };

            let async_fd = AsyncFd::new(owned_fd)
                .map_err(|e| IftrackError::Netlink(format!("Failed to create AsyncFd: {}", e)))?;

            debug!("Created async netlink socket with epoll integration");

            Ok(Self {
                inner: async_fd,
                socket,
            })
        }

        /// Receive link events asynchronously using epoll
        pub async fn recv_events(&mut self) -> Result<Vec<(LinkEventKind, LinkDescriptor)>> {
            loop {
                let mut guard = self
                    .inner
                    .readable()
                    .await
                    .map_err(|e| IftrackError::Netlink(format!("AsyncFd readable error: {}", e)))?;

                match guard.try_io(|_| {
                    self.socket
                        .try_receive_events()
                        .map_err(std::io::Error::other)
                }) {
                    Ok(Ok(Some(events))) => return Ok(events),
                    Ok(Ok(None)) => {
                        // EAGAIN - clear readiness and wait again
                        guard.clear_ready();
                        continue;
                    }
                    Ok(Err(e)) => {
                        return Err(IftrackError::Netlink(format!("Receive error: {}", e)));
                    }
                    Err(_would_block) => {
                        // Spurious wakeup, continue waiting
                        continue;
                    }
                }
            }
        }

        /// Request a dump of the link table
        pub fn request_dump(&mut self) -> Result<()> {
            self.socket.request_dump()
        }

        /// Get the raw file descriptor
        pub fn as_raw_fd(&self) -> i32 {
            self.socket.as_raw_fd()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_create_socket() {
            let socket = NetlinkSocket::new();
            assert!(socket.is_ok(), "Failed to create socket: {:?}", socket.err());
        }

        #[test]
        fn test_interface_cache_insert_get() {
            let mut cache = InterfaceCache::default();
            assert!(cache.get(7).is_none());
            cache.insert(7, "eth7".to_string());
            assert_eq!(cache.get(7), Some("eth7"));
        }

        #[test]
        fn test_parse_speed_value() {
            assert_eq!(parse_speed_value("1000\n"), Some(1000));
            assert_eq!(parse_speed_value("-1\n"), None);
            assert_eq!(parse_speed_value("garbage"), None);
        }

        #[test]
        fn test_extract_vlan_id_non_vlan() {
            assert_eq!(extract_vlan_id(&[LinkInfo::Kind(InfoKind::Bridge)]), None);
        }

        /// Build a finalized RTM_NEWLINK message, optionally nameless
        fn new_link_message(index: u32, name: Option<&str>) -> NetlinkMessage<RouteNetlinkMessage> {
            let mut link = LinkMessage::default();
            link.header.index = index;
            link.header.flags = LinkFlags::Up | LinkFlags::Running;
            if let Some(name) = name {
                link.attributes.push(LinkAttribute::IfName(name.to_string()));
            }
            let mut msg = NetlinkMessage::new(
                NetlinkHeader::default(),
                NetlinkPayload::InnerMessage(RouteNetlinkMessage::NewLink(link)),
            );
            msg.finalize();
            msg
        }

        #[test]
        fn test_parse_new_link_without_name_is_malformed() {
            let mut socket = NetlinkSocket::new().unwrap();

            // Index 7 was never cached, so the name cannot be recovered
            let msg = new_link_message(7, None);
            let err = socket.parse_link_message(&msg).unwrap_err();
            assert!(matches!(err, IftrackError::MalformedDescriptor(_)));
        }

        #[test]
        fn test_parse_del_link_without_name_yields_down() {
            let mut socket = NetlinkSocket::new().unwrap();

            let mut link = LinkMessage::default();
            link.header.index = 99;
            let mut msg = NetlinkMessage::new(
                NetlinkHeader::default(),
                NetlinkPayload::InnerMessage(RouteNetlinkMessage::DelLink(link)),
            );
            msg.finalize();

            // Index alone suffices to untrack, an empty name is allowed
            let (kind, descriptor) = socket.parse_link_message(&msg).unwrap().unwrap();
            assert_eq!(kind, LinkEventKind::Down);
            assert_eq!(descriptor.index, 99);
            assert!(descriptor.name.is_empty());
        }

        #[test]
        fn test_parse_buffer_drops_nameless_message_keeps_sibling() {
            let mut socket = NetlinkSocket::new().unwrap();

            let mut offset = 0;
            for msg in [new_link_message(7, None), new_link_message(8, Some("eth8"))] {
                let len = msg.buffer_len();
                msg.serialize(&mut socket.buffer[offset..offset + len]);
                offset = (offset + len + 3) & !3;
            }

            let events = socket.parse_buffer(offset).unwrap();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].0, LinkEventKind::Up);
            assert_eq!(events[0].1.index, 8);
            assert_eq!(events[0].1.name, "eth8");
        }

        #[test]
        fn test_parse_buffer_survives_trailing_garbage() {
            let mut socket = NetlinkSocket::new().unwrap();

            let msg = new_link_message(8, Some("eth8"));
            let len = msg.buffer_len();
            msg.serialize(&mut socket.buffer[..len]);
            socket.buffer[len..len + 16].fill(0xff);

            // The corrupt tail is discarded, not turned into an error
            let events = socket.parse_buffer(len + 16).unwrap();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].1.index, 8);
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux::*;

/// Mock implementation for non-Linux platforms (development only)
#[cfg(not(target_os = "linux"))]
mod mock {
    use crate::error::Result;
    use crate::types::{LinkDescriptor, LinkEventKind};

    #[derive(Debug, Default)]
    pub struct InterfaceCache;

    impl InterfaceCache {
        #[allow(unused_variables)]
        pub fn resolve(&mut self, ifindex: u32) -> Option<&str> {
            Some("mock0")
        }
    }

    pub struct NetlinkSocket;

    impl NetlinkSocket {
        pub fn new() -> Result<Self> {
            Ok(Self)
        }

        pub fn as_raw_fd(&self) -> i32 {
            -1
        }

        pub fn request_dump(&mut self) -> Result<()> {
            Ok(())
        }

        pub fn receive_events(&mut self) -> Result<Vec<(LinkEventKind, LinkDescriptor)>> {
            Ok(Vec::new())
        }

        pub fn try_receive_events(&mut self) -> Result<Option<Vec<(LinkEventKind, LinkDescriptor)>>> {
            Ok(Some(Vec::new()))
        }
    }

    /// Mock async netlink socket for non-Linux platforms
    pub struct AsyncNetlinkSocket;

    impl AsyncNetlinkSocket {
        pub fn new() -> Result<Self> {
            Ok(Self)
        }

        pub async fn recv_events(&mut self) -> Result<Vec<(LinkEventKind, LinkDescriptor)>> {
            // In mock, just sleep to prevent busy-loop in tests
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            Ok(Vec::new())
        }

        pub fn request_dump(&mut self) -> Result<()> {
            Ok(())
        }

        pub fn as_raw_fd(&self) -> i32 {
            -1
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub use mock::*;
