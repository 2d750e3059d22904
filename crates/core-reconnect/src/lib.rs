//! Tether Core Reconnect: Pure-logic connection life-cycle driver
//!
//! # Overview
//!
//! This crate keeps a single logical TCP connection alive across transient
//! failures. It provides:
//!
//! - **Connection State Machine**: `disconnected → connecting → connected → ready`, with close from anywhere
//! - **Backoff Scheduler**: half-second fallback across resolved candidates, jittered spacing once they run out
//! - **Error Suppressor**: withholds failure messages for 15 minutes after repeated short-lived sessions
//! - **Adapters**: resolver, transport, clock, jitter and logger seams, each injectable
//!
//! # Key Principles
//!
//! This crate is **pure logic** with zero knowledge of:
//! - Event loops or async runtimes
//! - Sockets and name services (they arrive through the `Connector` and `Resolver` traits)
//! - The bytes exchanged over the stream
//!
//! Every operation returns immediately. The owner calls `heartbeat(now)` on a
//! timer and forwards transport notifications one at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Owning event loop               │
//! └───────┬─────────────────────┬───────────┘
//!         │ heartbeat(now)      │ handle_connect / read / write / close / error
//!         ▼                     ▼
//! ┌─────────────────────────────────────────┐
//! │       ReconnectingConnection            │  ← state machine
//! └──┬──────────────┬──────────────┬────────┘
//!    │              │              │
//!    ▼              ▼              ▼
//! ┌────────┐  ┌───────────┐  ┌────────────┐
//! │Resolver│  │  Backoff  │  │   Error    │
//! │        │  │ Scheduler │  │ Suppressor │
//! └────────┘  └─────┬─────┘  └─────┬──────┘
//!                   │              │
//!              JitterSource   ConnectionLogger
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use tether_core_reconnect::{
//!     Candidate, ConnectionHandler, Connector, ReconnectingConnection, Transport, TransportError,
//! };
//! use std::net::SocketAddr;
//! use std::time::Duration;
//!
//! # struct MySocket;
//! # impl Transport for MySocket {
//! #     fn connect(&mut self, _addr: SocketAddr) -> Result<(), TransportError> { Ok(()) }
//! #     fn close(&mut self) -> Result<(), TransportError> { Ok(()) }
//! # }
//! struct MyConnector;
//!
//! impl Connector for MyConnector {
//!     type Transport = MySocket;
//!
//!     fn create(&mut self, _candidate: &Candidate) -> Result<MySocket, TransportError> {
//!         // Open a non-blocking socket for this candidate
//! #       Ok(MySocket)
//!     }
//! }
//!
//! struct Greeter;
//!
//! impl ConnectionHandler<MySocket> for Greeter {
//!     fn start_connection(&mut self, _socket: &mut MySocket) {
//!         // Send the protocol hello
//!     }
//! }
//!
//! let mut conn = ReconnectingConnection::new("feed.example", 30005, MyConnector, Greeter);
//! conn.reconnect();
//!
//! // Inside the event loop:
//! conn.heartbeat(Duration::from_secs(12));
//! ```

pub mod backoff;
pub mod clock;
pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod jitter;
pub mod logger;
pub mod resolver;
pub mod state;
pub mod suppression;
pub mod transport;

// Re-export main types for convenience
pub use backoff::BackoffScheduler;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::ReconnectConfig;
pub use connection::{ConnectionSnapshot, ReconnectingConnection};
pub use error::{ReconnectError, ResolveError, TransportError};
pub use handler::{ConnectionHandler, NoopHandler};
pub use jitter::{JitterSource, RandJitter, ScriptedJitter};
pub use logger::{ConnectionEvent, ConnectionLogger, RecordingLogger, TracingLogger};
pub use resolver::{AddressFamily, Candidate, Resolver, SocketType, StaticResolver, SystemResolver};
pub use state::ConnectionState;
pub use suppression::ErrorSuppressor;
pub use transport::{Connector, FaultCategory, Transport, TransportFault};

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use tether_core_reconnect::prelude::*;
/// ```
pub mod prelude {
    pub use super::clock::{Clock, MonotonicClock};
    pub use super::config::ReconnectConfig;
    pub use super::connection::ReconnectingConnection;
    pub use super::handler::ConnectionHandler;
    pub use super::resolver::{Candidate, Resolver};
    pub use super::state::ConnectionState;
    pub use super::transport::{Connector, FaultCategory, Transport, TransportFault};
}
