//! Transport contract
//!
//! A transport is one socket attempt: created per candidate, asked to begin a
//! non-blocking connect, and closed when the session ends. Completion, data
//! and faults arrive later through the owning event loop, which calls the
//! connection's `handle_*` entry points.

use crate::error::TransportError;
use crate::resolver::Candidate;
use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Coarse classification of a fault reported by the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCategory {
    /// Expected network trouble: resets, refusals, timeouts, unreachable hosts
    Network,
    /// Anything else; logged with full detail regardless of suppression
    Unexpected,
}

/// A fault delivered through `handle_error`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFault {
    pub category: FaultCategory,
    pub message: String,
}

impl TransportFault {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            category: FaultCategory::Network,
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self {
            category: FaultCategory::Unexpected,
            message: message.into(),
        }
    }

    /// Classify a socket error. Every I/O error is network-class.
    pub fn from_io(err: &io::Error) -> Self {
        Self::network(err.to_string())
    }

    pub fn is_network(&self) -> bool {
        self.category == FaultCategory::Network
    }
}

impl From<&TransportError> for TransportFault {
    fn from(err: &TransportError) -> Self {
        match err {
            TransportError::Io(io_err) => Self::from_io(io_err),
            TransportError::AlreadyClosed => Self::network(err.to_string()),
            TransportError::Other(message) => Self::unexpected(message.clone()),
        }
    }
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A single socket owned by the connection for one attempt
pub trait Transport {
    /// Begin connecting. Must not block; completion is reported later.
    fn connect(&mut self, addr: SocketAddr) -> Result<(), TransportError>;

    /// Release the socket. A second close may return
    /// [`TransportError::AlreadyClosed`], which callers ignore.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Creates transports for resolved candidates
pub trait Connector {
    type Transport: Transport;

    fn create(&mut self, candidate: &Candidate) -> Result<Self::Transport, TransportError>;
}
