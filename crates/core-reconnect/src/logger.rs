//! Injected logging for connection events
//!
//! The connection decides *whether* to emit (the suppression gate lives in
//! the connection); the logger decides *how*. [`TracingLogger`] is the
//! production choice, [`RecordingLogger`] captures events for assertions.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

/// Something worth telling the operator about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Resolution or a synchronous connect failed
    ConnectFailed { reason: String },
    /// An established or in-flight session went away on its own
    LostConnection,
    /// The owner asked to disconnect
    Disconnecting { reason: String },
    /// The transport reported a network-class fault
    ConnectionLost { reason: String },
    /// The transport reported a fault outside the network class
    UnexpectedFault { detail: String },
    /// Further failure messages will be withheld for `window`
    SuppressionEnabled { window: Duration },
}

/// Sink for [`ConnectionEvent`]s
pub trait ConnectionLogger {
    fn log(&self, host: &str, port: u16, event: &ConnectionEvent);
}

/// Emits events through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ConnectionLogger for TracingLogger {
    fn log(&self, host: &str, port: u16, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::ConnectFailed { reason } => {
                warn!(host, port, "Connection to {}:{} failed: {}", host, port, reason)
            }
            ConnectionEvent::LostConnection => {
                warn!(host, port, "Lost connection to {}:{}", host, port)
            }
            ConnectionEvent::Disconnecting { reason } => {
                info!(host, port, "Disconnecting from {}:{}: {}", host, port, reason)
            }
            ConnectionEvent::ConnectionLost { reason } => {
                warn!(host, port, "Connection to {}:{} lost: {}", host, port, reason)
            }
            ConnectionEvent::UnexpectedFault { detail } => {
                error!(
                    host,
                    port,
                    detail = %detail,
                    "Unexpected fault on connection to {}:{}",
                    host,
                    port
                )
            }
            ConnectionEvent::SuppressionEnabled { window } => info!(
                host,
                port,
                "Connection retries will continue, further messages about this connection will be suppressed for {} minutes",
                window.as_secs() / 60
            ),
        }
    }
}

/// Keeps every event in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    events: Arc<Mutex<Vec<ConnectionEvent>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far
    pub fn events(&self) -> Vec<ConnectionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Drain the buffer
    pub fn take(&self) -> Vec<ConnectionEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConnectionLogger for RecordingLogger {
    fn log(&self, _host: &str, _port: u16, event: &ConnectionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

impl<L: ConnectionLogger + ?Sized> ConnectionLogger for Arc<L> {
    fn log(&self, host: &str, port: u16, event: &ConnectionEvent) {
        (**self).log(host, port, event)
    }
}
