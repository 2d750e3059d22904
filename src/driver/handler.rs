//! Demo protocol handler for the `tether` binary

use tether_core_reconnect::ConnectionHandler;
use tracing::{debug, info, warn};

use super::tcp::TcpTransport;

/// Logs each received line and optionally greets the peer on every session
#[derive(Debug, Clone, Default)]
pub struct LineLogger {
    greeting: Option<Vec<u8>>,
    sessions: u64,
    session_bytes: u64,
    total_bytes: u64,
    lines: Vec<String>,
    partial: Vec<u8>,
    keep_lines: bool,
}

impl LineLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `greeting` followed by a newline when each session starts
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        let mut bytes = greeting.into().into_bytes();
        bytes.push(b'\n');
        self.greeting = Some(bytes);
        self
    }

    /// Retain received lines in memory as well as logging them
    pub fn keep_lines(mut self) -> Self {
        self.keep_lines = true;
        self
    }

    /// Sessions that reached `start_connection`
    pub fn sessions(&self) -> u64 {
        self.sessions
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn consume(&mut self, chunk: &[u8]) {
        self.session_bytes += chunk.len() as u64;
        self.total_bytes += chunk.len() as u64;
        self.partial.extend_from_slice(chunk);

        while let Some(end) = self.partial.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw[..end])
                .trim_end_matches('\r')
                .to_string();
            debug!(line = %line, "Received line");
            if self.keep_lines {
                self.lines.push(line);
            }
        }
    }
}

impl ConnectionHandler<TcpTransport> for LineLogger {
    fn reset_connection(&mut self) {
        self.session_bytes = 0;
        self.partial.clear();
    }

    fn start_connection(&mut self, transport: &mut TcpTransport) {
        self.sessions += 1;
        info!(
            session = self.sessions,
            peer = ?transport.peer(),
            "Session started"
        );
        if let Some(greeting) = &self.greeting {
            if let Err(e) = transport.send(greeting.clone()) {
                warn!("Failed to queue greeting: {}", e);
            }
        }
    }

    fn lost_connection(&mut self) {
        info!(
            session = self.sessions,
            bytes = self.session_bytes,
            "Session ended"
        );
    }

    fn handle_read(&mut self, transport: &mut TcpTransport) {
        for chunk in transport.take_received() {
            self.consume(&chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_lines_across_chunks() {
        let mut handler = LineLogger::new().keep_lines();
        handler.consume(b"first\r\nsec");
        handler.consume(b"ond\nthird");

        assert_eq!(handler.lines(), ["first", "second"]);
        assert_eq!(handler.total_bytes(), 19);

        // a torn-down session forgets its unterminated tail
        ConnectionHandler::<TcpTransport>::reset_connection(&mut handler);
        handler.consume(b"fresh\n");
        assert_eq!(handler.lines(), ["first", "second", "fresh"]);
    }

    #[test]
    fn test_greeting_is_newline_terminated() {
        let handler = LineLogger::new().with_greeting("HELLO");
        assert_eq!(handler.greeting.as_deref(), Some(&b"HELLO\n"[..]));
    }

    #[test]
    fn test_lines_not_kept_by_default() {
        let mut handler = LineLogger::new();
        handler.consume(b"a\nb\n");
        assert!(handler.lines().is_empty());
        assert_eq!(handler.total_bytes(), 4);
    }
}
