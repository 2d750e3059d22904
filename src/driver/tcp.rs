//! Tokio-backed TCP transport
//!
//! Each attempt gets its own socket task. The task reports what happens to the
//! socket as [`TransportEvent`]s tagged with the attempt number, and the
//! [`Driver`](super::Driver) feeds them back into the state machine. Events
//! from an attempt that has since been replaced are dropped by the driver.

use std::collections::VecDeque;
use std::net::SocketAddr;
use tether_core_reconnect::{Candidate, Connector, Transport, TransportError, TransportFault};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

const READ_BUFFER_SIZE: usize = 16 * 1024;

/// What a socket task observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The outbound connect completed
    Connected,
    /// Bytes arrived from the peer
    Data(Vec<u8>),
    /// The peer closed the stream
    Closed,
    /// Connect, read or write failed
    Failed(TransportFault),
}

/// A [`TransportEvent`] together with the attempt that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedEvent {
    pub attempt: u64,
    pub event: TransportEvent,
}

/// Creates one [`TcpTransport`] per attempt, all reporting on one channel
#[derive(Debug)]
pub struct TcpConnector {
    events: UnboundedSender<TaggedEvent>,
    next_attempt: u64,
}

impl TcpConnector {
    /// Create a connector and the receiving end of its event channel
    pub fn new() -> (Self, UnboundedReceiver<TaggedEvent>) {
        let (events, receiver) = unbounded_channel();
        (
            Self {
                events,
                next_attempt: 0,
            },
            receiver,
        )
    }

    /// Number of transports created so far
    pub fn attempts(&self) -> u64 {
        self.next_attempt
    }
}

impl Connector for TcpConnector {
    type Transport = TcpTransport;

    fn create(&mut self, candidate: &Candidate) -> Result<TcpTransport, TransportError> {
        self.next_attempt += 1;
        trace!(attempt = self.next_attempt, candidate = %candidate, "Creating transport");
        Ok(TcpTransport::new(self.next_attempt, self.events.clone()))
    }
}

/// One TCP stream, owned by a spawned socket task
#[derive(Debug)]
pub struct TcpTransport {
    attempt: u64,
    events: UnboundedSender<TaggedEvent>,
    outgoing: Option<UnboundedSender<Vec<u8>>>,
    task: Option<JoinHandle<()>>,
    received: VecDeque<Vec<u8>>,
    peer: Option<SocketAddr>,
    closed: bool,
}

impl TcpTransport {
    fn new(attempt: u64, events: UnboundedSender<TaggedEvent>) -> Self {
        Self {
            attempt,
            events,
            outgoing: None,
            task: None,
            received: VecDeque::new(),
            peer: None,
            closed: false,
        }
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Address this transport was pointed at
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Queue bytes for the socket task to write
    pub fn send(&mut self, bytes: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::AlreadyClosed);
        }
        let outgoing = self
            .outgoing
            .as_ref()
            .ok_or_else(|| TransportError::Other("transport is not connected".to_string()))?;
        outgoing
            .send(bytes.into())
            .map_err(|_| TransportError::Other("socket task has exited".to_string()))
    }

    /// Stash bytes delivered by the socket task until the handler reads them
    pub(crate) fn push_received(&mut self, bytes: Vec<u8>) {
        self.received.push_back(bytes);
    }

    /// Drain everything received since the last call
    pub fn take_received(&mut self) -> Vec<Vec<u8>> {
        self.received.drain(..).collect()
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, addr: SocketAddr) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::AlreadyClosed);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Other(format!("no async runtime: {}", e)))?;

        let (outgoing, incoming) = unbounded_channel();
        let events = self.events.clone();
        let attempt = self.attempt;

        self.task = Some(runtime.spawn(run_socket(attempt, addr, events, incoming)));
        self.outgoing = Some(outgoing);
        self.peer = Some(addr);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::AlreadyClosed);
        }
        self.closed = true;
        self.outgoing = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        debug!(attempt = self.attempt, "Transport closed");
        Ok(())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Socket task body: connect, then pump reads and queued writes until either side ends
async fn run_socket(
    attempt: u64,
    addr: SocketAddr,
    events: UnboundedSender<TaggedEvent>,
    mut outgoing: UnboundedReceiver<Vec<u8>>,
) {
    let report = |event: TransportEvent| {
        // receiver gone means the driver shut down
        let _ = events.send(TaggedEvent { attempt, event });
    };

    let stream = match TcpStream::connect(addr).await {
        Ok(stream) => stream,
        Err(e) => {
            report(TransportEvent::Failed(TransportFault::from_io(&e)));
            return;
        }
    };
    report(TransportEvent::Connected);

    let (mut reader, mut writer) = stream.into_split();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        tokio::select! {
            read = reader.read(&mut buffer) => match read {
                Ok(0) => {
                    report(TransportEvent::Closed);
                    break;
                }
                Ok(n) => report(TransportEvent::Data(buffer[..n].to_vec())),
                Err(e) => {
                    report(TransportEvent::Failed(TransportFault::from_io(&e)));
                    break;
                }
            },
            queued = outgoing.recv() => match queued {
                Some(bytes) => {
                    if let Err(e) = writer.write_all(&bytes).await {
                        report(TransportEvent::Failed(TransportFault::from_io(&e)));
                        break;
                    }
                }
                // transport closed or dropped
                None => break,
            },
        }
    }
}
