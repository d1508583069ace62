//! Error types for iftrackd

use thiserror::Error;

/// Errors that can occur in iftrackd
///
/// Steady-state errors (registry full, malformed descriptors) are handled
/// locally by the ingestion path: the triggering event is dropped and logged.
/// Netlink and query-surface errors are fatal only at startup.
#[derive(Debug, Error)]
pub enum IftrackError {
    /// Netlink socket error
    #[error("Netlink error: {0}")]
    Netlink(String),

    /// A link notification was missing required fields
    #[error("Malformed link descriptor: {0}")]
    MalformedDescriptor(String),

    /// The registry has reached its capacity bound
    #[error("Interface registry full (capacity {capacity})")]
    RegistryFull { capacity: usize },

    /// Query surface (HTTP listener) error
    #[error("Query surface error: {0}")]
    QuerySurface(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for iftrackd operations
pub type Result<T> = std::result::Result<T, IftrackError>;
