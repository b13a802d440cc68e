//! Connection state machine.
//!
//! ```text
//!                 connect()
//! Disconnected ────────────► Connecting ──ok──► Open
//!      ▲                         │               │ unclean close
//!      │ disconnect()            │ failed        ▼
//!      │ (from any state)        ▼          Reconnecting ──ok──► Open
//!      └──────────────────── Closed ◄── budget exhausted
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::{error, trace};

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of one transport instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Never connected, or explicitly disconnected.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Ready to send and receive.
    Open,
    /// Lost the connection; an automatic retry is scheduled or running.
    Reconnecting,
    /// Gave up: handshake failed or reconnect budget exhausted.
    Closed,
}

impl ConnectionState {
    /// Returns `true` if messages can be sent.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if a handshake is pending or scheduled.
    #[inline]
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Connecting | Self::Reconnecting)
    }

    /// Returns `true` if `self -> next` is a legal transition.
    ///
    /// `Open` is only reachable through a handshake state, and
    /// `Disconnected` is reachable from anywhere.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use ConnectionState::*;

        matches!(
            (self, next),
            (_, Disconnected)
                | (Disconnected | Closed | Reconnecting, Connecting)
                | (Connecting | Reconnecting, Open)
                | (Open | Reconnecting, Reconnecting)
                | (Connecting | Open | Reconnecting, Closed)
        )
    }

    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Reconnecting => "reconnecting",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// StateCell
// ============================================================================

/// Holder for a [`ConnectionState`] that only accepts legal transitions.
///
/// Lives inside the owning transport's mutex, so transitions are strictly
/// sequential.
#[derive(Debug, Default)]
pub(crate) struct StateCell {
    current: ConnectionState,
}

impl StateCell {
    /// Returns the current state.
    #[inline]
    pub(crate) fn get(&self) -> ConnectionState {
        self.current
    }

    /// Moves to `next`, returning `false` (and leaving the state untouched)
    /// if the transition is illegal.
    pub(crate) fn transition(&mut self, next: ConnectionState) -> bool {
        if self.current == next {
            return true;
        }

        if !self.current.can_transition_to(next) {
            error!(from = %self.current, to = %next, "Rejected illegal state transition");
            return false;
        }

        trace!(from = %self.current, to = %next, "State transition");
        self.current = next;
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::ConnectionState::*;
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), Disconnected);
        assert_eq!(StateCell::default().get(), Disconnected);
    }

    #[test]
    fn test_open_requires_handshake_state() {
        assert!(!Disconnected.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Open));
        assert!(Connecting.can_transition_to(Open));
        assert!(Reconnecting.can_transition_to(Open));
    }

    #[test]
    fn test_disconnect_from_anywhere() {
        for state in [Disconnected, Connecting, Open, Reconnecting, Closed] {
            assert!(state.can_transition_to(Disconnected), "{state}");
        }
    }

    #[test]
    fn test_cell_rejects_skipped_handshake() {
        let mut cell = StateCell::default();
        assert!(!cell.transition(Open));
        assert_eq!(cell.get(), Disconnected);

        assert!(cell.transition(Connecting));
        assert!(cell.transition(Open));
        assert!(cell.transition(Reconnecting));
        assert!(cell.transition(Closed));
        assert!(!cell.transition(Reconnecting));
        assert_eq!(cell.get(), Closed);
    }

    #[test]
    fn test_display() {
        assert_eq!(Reconnecting.to_string(), "reconnecting");
        assert!(Open.is_open());
        assert!(Connecting.is_transient());
        assert!(!Closed.is_transient());
    }
}
