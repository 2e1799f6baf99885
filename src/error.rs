//! Error types for the dependency graph client
//!
//! Projection, node-detail and path queries are independent failure domains:
//! each reports its own `QueryError` and none rolls back cached state.

use thiserror::Error;

use crate::types::Fingerprint;

/// Failure of a single gateway query
///
/// Cloneable so every caller coalesced onto one request receives the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Transport failure (connection refused, timeout, reset)
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// Success status with a payload that does not decode
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Response arrived after the request stopped being relevant
    #[error("response for {0:?} was superseded")]
    Stale(Fingerprint),
}

impl QueryError {
    /// Superseded responses are dropped silently, never shown to the user
    pub fn is_stale(&self) -> bool {
        matches!(self, QueryError::Stale(_))
    }
}

/// Unexpected message shape on the push channel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("malformed push message: {0}")]
    Malformed(String),
}

/// Failure of the push channel transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("push channel is closed")]
    Closed,

    #[error("failed to connect push channel: {0}")]
    Connect(String),

    #[error("failed to encode push message: {0}")]
    Encode(String),
}

/// Invalid path explorer transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no path set is ready")]
    NotReady,

    #[error("path index {index} out of range for {len} paths")]
    IndexOutOfRange { index: isize, len: usize },
}

/// The error type for client operations
#[derive(Debug, Error)]
pub enum Error {
    /// A selection change was requested before any graph file was chosen
    #[error("no graph file is active")]
    NoActiveGraph,

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Path(#[from] PathError),

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;
