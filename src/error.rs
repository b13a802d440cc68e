//! Error types for the session transport.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use ws_fallback::{Result, Transport};
//!
//! async fn login(transport: &dyn Transport) -> Result<()> {
//!     transport.connect().await?;
//!     transport.send(Message::auth_request("admin", "password"))?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | Connection | [`Error::Connection`], [`Error::EndpointUnreachable`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | State | [`Error::NotConnected`], [`Error::InvalidState`] |
//! | Protocol | [`Error::Protocol`], [`Error::Json`] |
//!
//! Protocol errors never reach callers of a transport: malformed inbound
//! frames are logged and dropped inside the event loop.

// ============================================================================
// Imports
// ============================================================================

use std::io::ErrorKind;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::transport::ConnectionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when factory or transport options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint URL is not a usable WebSocket URL.
    #[error("Invalid endpoint URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed for a reason other than reachability.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Nothing is listening at the endpoint, or it cannot be routed to.
    #[error("Endpoint unreachable: {url} ({message})")]
    EndpointUnreachable {
        /// Endpoint that was dialed.
        url: String,
        /// Underlying OS diagnostic.
        message: String,
    },

    /// Handshake or probe did not complete in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Connection was closed while the operation was in flight.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // State Errors
    // ========================================================================
    /// Message send attempted while the transport is not open.
    ///
    /// The message was not written and is not queued.
    #[error("Transport is not connected (state: {state})")]
    NotConnected {
        /// State observed at the time of the call.
        state: ConnectionState,
    },

    /// Operation is not allowed in the current state.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// State observed at the time of the call.
        state: ConnectionState,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Frame is not a well-formed `{type, payload}` envelope.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an endpoint unreachable error.
    #[inline]
    pub fn endpoint_unreachable(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EndpointUnreachable {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a not connected error.
    #[inline]
    pub fn not_connected(state: ConnectionState) -> Self {
        Self::NotConnected { state }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(operation: &'static str, state: ConnectionState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Classifies a failed WebSocket handshake against `url`.
    ///
    /// Refused, reset and unroutable sockets become
    /// [`Error::EndpointUnreachable`]; a malformed URL becomes
    /// [`Error::InvalidUrl`]; everything else is [`Error::Connection`].
    pub fn from_handshake(url: &str, err: WsError) -> Self {
        match err {
            WsError::Io(io) if is_unreachable(io.kind()) => {
                Self::endpoint_unreachable(url, io.to_string())
            }
            WsError::Url(e) => Self::invalid_url(url, e.to_string()),
            other => Self::connection(format!("WebSocket handshake with {url} failed: {other}")),
        }
    }
}

/// IO error kinds meaning "nobody is there".
fn is_unreachable(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotFound
            | ErrorKind::AddrNotAvailable
            | ErrorKind::HostUnreachable
            | ErrorKind::NetworkUnreachable
            | ErrorKind::TimedOut
    )
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::EndpointUnreachable { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
        )
    }

    /// Returns `true` if this is a state error.
    #[inline]
    #[must_use]
    pub fn is_state_error(&self) -> bool {
        matches!(self, Self::NotConnected { .. } | Self::InvalidState { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. }
                | Self::EndpointUnreachable { .. }
                | Self::ConnectionClosed
                | Self::NotConnected { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
