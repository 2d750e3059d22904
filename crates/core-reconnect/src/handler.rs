//! Protocol-layer hooks
//!
//! A [`ConnectionHandler`] is what the consuming protocol client plugs in. The
//! core never looks at the bytes; it only tells the handler when a session
//! starts, ends, or has I/O readiness, and hands it the live transport.

/// Life-cycle hooks and I/O extension points. Every method defaults to a no-op.
pub trait ConnectionHandler<T> {
    /// Before each attempt and again after a session is torn down
    fn reset_connection(&mut self) {}

    /// The transport finished connecting
    fn start_connection(&mut self, _transport: &mut T) {}

    /// A session that had started (or was starting) has ended
    fn lost_connection(&mut self) {}

    /// The transport has data to read
    fn handle_read(&mut self, _transport: &mut T) {}

    /// The transport can accept writes
    fn handle_write(&mut self, _transport: &mut T) {}
}

/// Handler that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl<T> ConnectionHandler<T> for NoopHandler {}

impl<T, H: ConnectionHandler<T> + ?Sized> ConnectionHandler<T> for Box<H> {
    fn reset_connection(&mut self) {
        (**self).reset_connection()
    }

    fn start_connection(&mut self, transport: &mut T) {
        (**self).start_connection(transport)
    }

    fn lost_connection(&mut self) {
        (**self).lost_connection()
    }

    fn handle_read(&mut self, transport: &mut T) {
        (**self).handle_read(transport)
    }

    fn handle_write(&mut self, transport: &mut T) {
        (**self).handle_write(transport)
    }
}
