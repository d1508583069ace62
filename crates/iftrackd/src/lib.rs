//! Network interface inventory daemon
//!
//! iftrackd keeps a live, queryable inventory of the host's network
//! interfaces: identity, classification, link attributes, administrative
//! state, and master-device association. It consumes kernel link events
//! over netlink and serves point-in-time snapshots over HTTP; callers
//! never re-enumerate devices to answer a query.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌───────────────────────┐     ┌─────────────────┐
//! │  Linux Kernel   │     │       iftrackd        │     │  Query clients  │
//! │                 │     │                       │     │                 │
//! │  RTM_NEWLINK    │────▶│  AsyncNetlinkSocket   │     │  GET /interfaces│
//! │  RTM_DELLINK    │     │         │             │     │  GET /metrics   │
//! │  (RTNLGRP_LINK) │     │         ▼             │     │                 │
//! │                 │     │   EventIngestor       │     └────────▲────────┘
//! └─────────────────┘     │         │             │              │
//!                         │         ▼             │              │
//!                         │  InterfaceRegistry ───┼── snapshot ──┘
//!                         └───────────────────────┘
//! ```
//!
//! The registry is the sole point of coordination: the event path mutates
//! it, the query path reads snapshots, and neither talks to the other.

pub mod error;
pub mod ingest;
pub mod link_sync;
pub mod metrics;
pub mod netlink;
pub mod query_server;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod types;

pub use error::{IftrackError, Result};
pub use ingest::EventIngestor;
pub use link_sync::LinkSync;
pub use metrics::MetricsCollector;
pub use netlink::{AsyncNetlinkSocket, NetlinkSocket};
pub use query_server::{start_query_server, QueryServerHandle, DEFAULT_QUERY_PORT};
pub use registry::{InterfaceRegistry, MAX_TRACKED_INTERFACES};
pub use resolver::{classify, resolve, ResolvedAttributes};
pub use types::{
    AdminState, InterfaceKind, InterfaceRecord, LinkDescriptor, LinkEventKind, MacAddress,
};
