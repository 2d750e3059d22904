/*!
 * Tokio event loop around the reconnect state machine
 *
 * The state machine never blocks and never spawns. The driver owns it, ticks
 * `heartbeat` on a fixed interval and forwards socket task events one at a
 * time, so every call into the connection happens on a single task.
 */

pub mod handler;
pub mod tcp;

use std::future::Future;
use std::time::Duration;
use tether_core_reconnect::{
    Clock, ConnectionHandler, ConnectionLogger, ConnectionState, JitterSource, MonotonicClock,
    ReconnectingConnection, Resolver,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::TetherConfig;
use crate::error::Result;

pub use handler::LineLogger;
pub use tcp::{TaggedEvent, TcpConnector, TcpTransport, TransportEvent};

/// A reconnecting connection over tokio TCP sockets
pub type TetheredConnection<H> = ReconnectingConnection<TcpConnector, H>;

/// Runs a [`TetheredConnection`] until told to stop
pub struct Driver<H> {
    connection: TetheredConnection<H>,
    events: UnboundedReceiver<TaggedEvent>,
    clock: MonotonicClock,
    heartbeat: Duration,
}

impl<H> Driver<H>
where
    H: ConnectionHandler<TcpTransport>,
{
    /// Build a driver from validated configuration
    pub fn new(config: &TetherConfig, handler: H) -> Result<Self> {
        config.validate()?;

        let (connector, events) = TcpConnector::new();
        let clock = MonotonicClock::new();
        let connection =
            ReconnectingConnection::new(config.host.clone(), config.port, connector, handler)
                .with_config(config.reconnect.clone())?
                .with_clock(clock);

        Ok(Self {
            connection,
            events,
            clock,
            heartbeat: config.heartbeat_interval(),
        })
    }

    pub fn with_resolver(mut self, resolver: impl Resolver + Send + 'static) -> Self {
        self.connection = self.connection.with_resolver(resolver);
        self
    }

    pub fn with_jitter(mut self, jitter: impl JitterSource + Send + 'static) -> Self {
        self.connection = self.connection.with_jitter(jitter);
        self
    }

    pub fn with_logger(mut self, logger: impl ConnectionLogger + Send + 'static) -> Self {
        self.connection = self.connection.with_logger(logger);
        self
    }

    pub fn connection(&self) -> &TetheredConnection<H> {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut TetheredConnection<H> {
        &mut self.connection
    }

    /// Run until ctrl-c
    pub async fn run(&mut self) {
        self.run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received interrupt"),
                Err(e) => {
                    warn!("Cannot listen for ctrl-c, running until killed: {}", e);
                    std::future::pending::<()>().await
                }
            }
        })
        .await
    }

    /// Run until `shutdown` completes, then disconnect
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            host = self.connection.host(),
            port = self.connection.port(),
            "Starting connection"
        );
        if self.connection.state() == ConnectionState::Disconnected
            && self.connection.reconnect_at().is_none()
        {
            self.connection.reconnect();
        }

        let mut ticker = interval(self.heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => self.tick(),
                Some(tagged) = self.events.recv() => self.dispatch(tagged),
            }
        }

        self.connection.disconnect("Shutting down");
        debug!(snapshot = ?self.connection.snapshot(), "Driver stopped");
    }

    fn tick(&mut self) {
        self.connection.heartbeat(self.clock.now());
        if matches!(
            self.connection.state(),
            ConnectionState::Connected | ConnectionState::Ready
        ) {
            self.connection.handle_write();
        }
    }

    /// Forward one socket task event to the connection
    fn dispatch(&mut self, tagged: TaggedEvent) {
        let current = self.connection.transport().map(TcpTransport::attempt);
        if current != Some(tagged.attempt) {
            debug!(
                attempt = tagged.attempt,
                current = ?current,
                "Dropping event from a replaced transport"
            );
            return;
        }

        match tagged.event {
            TransportEvent::Connected => {
                if !self.connection.writable() {
                    debug!(attempt = tagged.attempt, "Connect completion with no attempt in flight");
                    return;
                }
                self.connection.handle_connect();
            }
            TransportEvent::Data(bytes) => {
                if let Some(transport) = self.connection.transport_mut() {
                    transport.push_received(bytes);
                }
                self.connection.handle_read();
            }
            TransportEvent::Closed => self.connection.handle_close(),
            TransportEvent::Failed(fault) => self.connection.handle_error(fault),
        }
    }
}
