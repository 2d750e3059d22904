//! Connection states and the transition table
//!
//! ```text
//! disconnected ──► connecting ──► connected ──► ready
//!       ▲               │              │          │
//!       └───────────────┴──────────────┴──────────┘
//!                        (close)
//! ```
//!
//! `Ready` is never entered by the core on its own; the protocol layer
//! promotes a connected session once its handshake is done.

use crate::error::ReconnectError;
use std::fmt;

/// Life-cycle state of a reconnecting connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No transport, or the transport has been torn down
    #[default]
    Disconnected,
    /// A connect attempt is outstanding
    Connecting,
    /// The transport reported a completed connect
    Connected,
    /// The protocol layer finished its handshake; heartbeat will not reconnect
    Ready,
}

impl ConnectionState {
    /// Whether `self -> next` is in the transition table
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connected, Ready)
                | (_, Disconnected)
        )
    }

    /// Validate a transition, returning the new state
    pub fn transition(self, next: ConnectionState) -> Result<ConnectionState, ReconnectError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ReconnectError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Ready => "ready",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    const ALL: [ConnectionState; 4] = [Disconnected, Connecting, Connected, Ready];

    #[test]
    fn test_forward_path() {
        assert_eq!(Disconnected.transition(Connecting).unwrap(), Connecting);
        assert_eq!(Connecting.transition(Connected).unwrap(), Connected);
        assert_eq!(Connected.transition(Ready).unwrap(), Ready);
    }

    #[test]
    fn test_every_state_can_close() {
        for state in ALL {
            assert!(state.can_transition_to(Disconnected), "{state} -> disconnected");
        }
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        assert!(Disconnected.transition(Connected).is_err());
        assert!(Disconnected.transition(Ready).is_err());
        assert!(Connecting.transition(Ready).is_err());
        assert!(Connecting.transition(Connecting).is_err());
        assert!(Ready.transition(Connecting).is_err());
        assert!(Ready.transition(Connected).is_err());
    }

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), Disconnected);
    }
}
