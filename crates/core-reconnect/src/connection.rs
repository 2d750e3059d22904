//! The connection life-cycle state machine
//!
//! [`ReconnectingConnection`] keeps one logical connection to `host:port`
//! alive. It never blocks and never spawns anything: the owning event loop
//! calls [`heartbeat`](ReconnectingConnection::heartbeat) on a timer and
//! forwards transport notifications to the `handle_*` methods, one at a time.
//!
//! # Failure path
//!
//! ```text
//!  fault / close ──► close(manual = false)
//!                      │  count short session, maybe arm suppression
//!                      │  close transport, notify handler
//!                      ▼
//!                 schedule_reconnect ──► reconnect_at
//!                                           │
//!  heartbeat(now >= reconnect_at) ◄─────────┘
//!                      │
//!                      ▼
//!                 reconnect ──► next candidate (re-resolve when empty)
//! ```
//!
//! No fault escapes these methods. Each one is logged through the
//! suppression gate and converted into another scheduled attempt.
//!
//! # Example
//!
//! ```
//! use tether_core_reconnect::{
//!     Candidate, ConnectionState, Connector, ManualClock, NoopHandler, ReconnectingConnection,
//!     ScriptedJitter, StaticResolver, Transport, TransportError,
//! };
//! use std::net::SocketAddr;
//! use std::time::Duration;
//!
//! struct NullTransport;
//! impl Transport for NullTransport {
//!     fn connect(&mut self, _addr: SocketAddr) -> Result<(), TransportError> { Ok(()) }
//!     fn close(&mut self) -> Result<(), TransportError> { Ok(()) }
//! }
//!
//! struct NullConnector;
//! impl Connector for NullConnector {
//!     type Transport = NullTransport;
//!     fn create(&mut self, _c: &Candidate) -> Result<NullTransport, TransportError> {
//!         Ok(NullTransport)
//!     }
//! }
//!
//! let clock = ManualClock::new();
//! let mut conn = ReconnectingConnection::new("test.example", 1234, NullConnector, NoopHandler)
//!     .with_resolver(StaticResolver::from_addrs(["192.0.2.1:1234".parse().unwrap()]))
//!     .with_jitter(ScriptedJitter::zero())
//!     .with_clock(clock.clone());
//!
//! conn.reconnect();
//! assert_eq!(conn.state(), ConnectionState::Connecting);
//! assert!(conn.writable());
//!
//! conn.handle_connect();
//! assert_eq!(conn.state(), ConnectionState::Connected);
//!
//! clock.advance(Duration::from_secs(60));
//! conn.handle_close();
//! assert_eq!(conn.state(), ConnectionState::Disconnected);
//! assert!(conn.reconnect_at().is_some());
//! ```

use crate::backoff::BackoffScheduler;
use crate::clock::{Clock, MonotonicClock};
use crate::config::ReconnectConfig;
use crate::error::{ReconnectError, ResolveError};
use crate::handler::ConnectionHandler;
use crate::jitter::{JitterSource, RandJitter};
use crate::logger::{ConnectionEvent, ConnectionLogger, TracingLogger};
use crate::resolver::{Candidate, Resolver, SystemResolver};
use crate::state::ConnectionState;
use crate::suppression::ErrorSuppressor;
use crate::transport::{Connector, FaultCategory, Transport, TransportFault};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Reason used when a reconnect has to tear down a live session first
const RECONNECT_REASON: &str = "About to reconnect";

/// Read-only view of a connection, for status reporting
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSnapshot {
    pub host: String,
    pub port: u16,
    pub state: ConnectionState,
    pub failures: u32,
    pub suppressing: bool,
    pub suppress_until: Duration,
    pub reconnect_at: Option<Duration>,
    pub last_try: Duration,
    pub pending_candidates: usize,
}

/// A TCP connection that reconnects itself
pub struct ReconnectingConnection<C: Connector, H> {
    host: String,
    port: u16,
    state: ConnectionState,
    addrlist: VecDeque<Candidate>,
    last_try: Duration,
    config: ReconnectConfig,
    scheduler: BackoffScheduler,
    suppressor: ErrorSuppressor,
    transport: Option<C::Transport>,
    connector: C,
    handler: H,
    resolver: Box<dyn Resolver + Send>,
    jitter: Box<dyn JitterSource + Send>,
    clock: Box<dyn Clock + Send>,
    logger: Box<dyn ConnectionLogger + Send>,
}

impl<C, H> ReconnectingConnection<C, H>
where
    C: Connector,
    H: ConnectionHandler<C::Transport>,
{
    /// Create a disconnected connection with default configuration, the
    /// system resolver, entropy-seeded jitter, a monotonic clock and
    /// `tracing` output. Nothing happens until [`reconnect`](Self::reconnect)
    /// or a scheduled heartbeat.
    pub fn new(host: impl Into<String>, port: u16, connector: C, handler: H) -> Self {
        let config = ReconnectConfig::default();
        Self {
            host: host.into(),
            port,
            state: ConnectionState::Disconnected,
            addrlist: VecDeque::new(),
            last_try: Duration::ZERO,
            scheduler: BackoffScheduler::new(&config),
            suppressor: ErrorSuppressor::new(&config),
            config,
            transport: None,
            connector,
            handler,
            resolver: Box::new(SystemResolver),
            jitter: Box::new(RandJitter::from_entropy()),
            clock: Box::new(MonotonicClock::new()),
            logger: Box::new(TracingLogger),
        }
    }

    /// Replace the configuration. Only meaningful before the first attempt;
    /// failure counts and schedules start over.
    pub fn with_config(mut self, config: ReconnectConfig) -> Result<Self, ReconnectError> {
        config.validate()?;
        self.scheduler = BackoffScheduler::new(&config);
        self.suppressor = ErrorSuppressor::new(&config);
        self.config = config;
        Ok(self)
    }

    pub fn with_resolver(mut self, resolver: impl Resolver + Send + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_jitter(mut self, jitter: impl JitterSource + Send + 'static) -> Self {
        self.jitter = Box::new(jitter);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_logger(mut self, logger: impl ConnectionLogger + Send + 'static) -> Self {
        self.logger = Box::new(logger);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }

    /// True exactly while a connect attempt is outstanding
    pub fn writable(&self) -> bool {
        self.state == ConnectionState::Connecting
    }

    pub fn reconnect_at(&self) -> Option<Duration> {
        self.scheduler.reconnect_at()
    }

    pub fn last_try(&self) -> Duration {
        self.last_try
    }

    pub fn failures(&self) -> u32 {
        self.suppressor.failures()
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppressor.is_active()
    }

    pub fn suppress_until(&self) -> Duration {
        self.suppressor.suppress_until()
    }

    /// Candidates left over from the last resolution, in the order they will be tried
    pub fn pending_candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.addrlist.iter()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn transport(&self) -> Option<&C::Transport> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut C::Transport> {
        self.transport.as_mut()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn connector_mut(&mut self) -> &mut C {
        &mut self.connector
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            host: self.host.clone(),
            port: self.port,
            state: self.state,
            failures: self.suppressor.failures(),
            suppressing: self.suppressor.is_active(),
            suppress_until: self.suppressor.suppress_until(),
            reconnect_at: self.scheduler.reconnect_at(),
            last_try: self.last_try,
            pending_candidates: self.addrlist.len(),
        }
    }

    /// Time-driven entry point. Starts a reconnect once the scheduled time
    /// has come, unless the protocol layer has marked the session ready.
    pub fn heartbeat(&mut self, now: Duration) {
        if self.state == ConnectionState::Ready {
            return;
        }
        if !self.scheduler.take_due(now) {
            return;
        }
        self.reconnect();
    }

    /// Start a new attempt against the next candidate, tearing down any
    /// current session first.
    pub fn reconnect(&mut self) {
        // this attempt supersedes any retry that was waiting
        self.scheduler.cancel();

        if self.state != ConnectionState::Disconnected {
            self.disconnect(RECONNECT_REASON);
        }

        let now = self.clock.now();
        if self.suppressor.expire_if_due(now) {
            debug!(host = %self.host, port = self.port, "error suppression window ended");
        }

        self.last_try = now;
        self.handler.reset_connection();

        match self.begin_attempt() {
            Ok(candidate) => {
                debug!(host = %self.host, port = self.port, "connecting to {}", candidate);
                self.set_state(ConnectionState::Connecting);
            }
            Err(err) => {
                if !self.suppressor.is_active() {
                    self.emit(ConnectionEvent::ConnectFailed {
                        reason: err.to_string(),
                    });
                }
                self.close(false);
            }
        }
    }

    fn begin_attempt(&mut self) -> Result<Candidate, ReconnectError> {
        if self.addrlist.is_empty() {
            self.addrlist = self.resolver.resolve(&self.host, self.port)?.into();
        }

        let candidate = self
            .addrlist
            .pop_front()
            .ok_or_else(|| ResolveError::NoAddresses {
                host: self.host.clone(),
                port: self.port,
            })?;

        let transport = self.connector.create(&candidate)?;
        self.transport
            .insert(transport)
            .connect(candidate.addr)?;

        Ok(candidate)
    }

    /// The transport finished connecting
    pub fn handle_connect(&mut self) {
        if let Err(err) = self.state.transition(ConnectionState::Connected) {
            debug!(host = %self.host, port = self.port, "ignoring connect notification: {}", err);
            return;
        }
        self.state = ConnectionState::Connected;

        // a successful connect confirms the resolution; re-resolve next time
        self.addrlist.clear();

        if let Some(transport) = self.transport.as_mut() {
            self.handler.start_connection(transport);
        }
    }

    pub fn handle_read(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            self.handler.handle_read(transport);
        }
    }

    pub fn handle_write(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            self.handler.handle_write(transport);
        }
    }

    /// The transport closed on its own
    pub fn handle_close(&mut self) {
        self.close(false);
    }

    /// The transport reported a fault
    pub fn handle_error(&mut self, fault: TransportFault) {
        match fault.category {
            FaultCategory::Network => {
                if !self.suppressor.is_active() {
                    self.emit(ConnectionEvent::ConnectionLost {
                        reason: fault.message,
                    });
                }
            }
            FaultCategory::Unexpected => {
                self.emit(ConnectionEvent::UnexpectedFault {
                    detail: fault.message,
                });
            }
        }
        self.handle_close();
    }

    /// Tear down the current session.
    ///
    /// `manual` marks an owner-initiated close: no loss message and no
    /// automatic reconnect. Failure accounting is the same either way.
    pub fn close(&mut self, manual: bool) {
        let now = self.clock.now();
        if self.suppressor.record_session(now.saturating_sub(self.last_try)) {
            self.set_error_suppression();
        }

        if let Some(mut transport) = self.transport.take() {
            if let Err(err) = transport.close() {
                if !err.is_already_closed() {
                    debug!(host = %self.host, port = self.port, "error closing transport: {}", err);
                }
            }
        }

        if self.state != ConnectionState::Disconnected {
            if !manual && !self.suppressor.is_active() {
                self.emit(ConnectionEvent::LostConnection);
            }
            self.set_state(ConnectionState::Disconnected);
            self.handler.reset_connection();
            self.handler.lost_connection();
        }

        if !manual {
            self.schedule_reconnect();
        }
    }

    /// Owner-initiated disconnect. Always succeeds; does not schedule a reconnect.
    pub fn disconnect(&mut self, reason: &str) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        if !self.suppressor.is_active() {
            self.emit(ConnectionEvent::Disconnecting {
                reason: reason.to_string(),
            });
        }
        self.close(true);
    }

    /// Schedule the next attempt unless one is already pending
    pub fn schedule_reconnect(&mut self) {
        let now = self.clock.now();
        let candidates_remaining = !self.addrlist.is_empty();
        if let Some(delay) =
            self.scheduler
                .schedule(now, self.last_try, candidates_remaining, self.jitter.as_mut())
        {
            debug!(
                host = %self.host,
                port = self.port,
                delay_secs = delay.as_secs_f64(),
                candidates_remaining,
                "reconnect scheduled"
            );
        }
    }

    /// Withhold failure messages for one suppression window
    pub fn set_error_suppression(&mut self) {
        let now = self.clock.now();
        self.suppressor.activate(now);
        self.emit(ConnectionEvent::SuppressionEnabled {
            window: self.suppressor.window(),
        });
    }

    /// Stop withholding messages; one more short session re-arms suppression
    pub fn reset_error_suppression(&mut self) {
        self.suppressor.reset();
    }

    /// Promote a connected session to ready; heartbeat stops reconnecting
    pub fn mark_ready(&mut self) -> Result<(), ReconnectError> {
        self.state = self.state.transition(ConnectionState::Ready)?;
        Ok(())
    }

    fn set_state(&mut self, next: ConnectionState) {
        match self.state.transition(next) {
            Ok(state) => self.state = state,
            Err(err) => debug!(host = %self.host, port = self.port, "{}", err),
        }
    }

    fn emit(&self, event: ConnectionEvent) {
        self.logger.log(&self.host, self.port, &event);
    }
}
