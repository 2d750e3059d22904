//! Error types for the reconnect core
//!
//! None of these escape the life-cycle entry points of
//! [`ReconnectingConnection`](crate::ReconnectingConnection): every fault is
//! absorbed there, logged through the suppression gate and turned into a
//! scheduled retry. They surface only from collaborators (resolvers,
//! transports) and from the few explicit operations that can be refused.

use crate::state::ConnectionState;
use std::io;
use thiserror::Error;

/// Errors reported by a [`Transport`](crate::Transport) or its [`Connector`](crate::Connector)
#[derive(Error, Debug)]
pub enum TransportError {
    /// The transport was already closed; close paths swallow this
    #[error("transport already closed")]
    AlreadyClosed,

    /// Socket-level failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether this error is the benign double-close case
    pub fn is_already_closed(&self) -> bool {
        matches!(self, TransportError::AlreadyClosed)
    }
}

/// Errors reported by a [`Resolver`](crate::Resolver)
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The underlying lookup failed
    #[error("lookup of {host}:{port} failed: {source}")]
    Lookup {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The lookup succeeded but produced no usable candidates
    #[error("no addresses found for {host}:{port}")]
    NoAddresses { host: String, port: u16 },
}

/// Errors produced by the connection life-cycle driver itself
#[derive(Error, Debug)]
pub enum ReconnectError {
    /// A state change outside the transition table was requested
    #[error("illegal state transition: {from} -> {to}")]
    IllegalTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// Address resolution failed
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Transport creation or connect failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    Config(String),
}
