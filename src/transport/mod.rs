//! WebSocket transport layer.
//!
//! This module defines the [`Transport`] contract and its two
//! implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  UI / caller    │      Arc<dyn Transport>      │  Backend        │
//! │                 │                              │  /ws/users      │
//! │  LiveTransport  │◄────────────────────────────►│                 │
//! │  (event loop)   │         WebSocket            │                 │
//! └─────────────────┘                              └─────────────────┘
//!
//! ┌─────────────────────┐
//! │ SimulatedTransport  │   same contract, no network: latency timers
//! └─────────────────────┘   and a synthesized auth_response
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `connect()` - Handshake (`Disconnected → Connecting → Open`)
//! 2. `add_message_listener()` / `messages()` - Subscribe to inbound messages
//! 3. `send_message()` - Write `{type, payload}` frames while `Open`
//! 4. Unclean close - `Reconnecting` with bounded backoff, then `Closed`
//! 5. `disconnect()` - Cancel timers, clear listeners, `Disconnected`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `live` | Network-backed transport and event loop |
//! | `simulated` | Offline stand-in |
//! | `listeners` | Ordered subscriber registry and message streams |
//! | `state` | Connection state machine |
//! | `backoff` | Reconnection policy |
//! | `probe` | One-shot reachability probe |
//! | `endpoint` | URL helpers |
//! | `options` | Transport configuration |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::SubscriptionId;
use crate::protocol::Message;

// ============================================================================
// Submodules
// ============================================================================

/// Reconnection backoff policy.
pub mod backoff;

/// Endpoint URL helpers.
pub mod endpoint;

/// Ordered subscriber registry and message streams.
pub mod listeners;

/// Network-backed transport.
pub mod live;

/// Transport configuration.
pub mod options;

/// One-shot connectivity probe.
pub mod probe;

/// Offline stand-in transport.
pub mod simulated;

/// Connection state machine.
pub mod state;

mod task;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::ReconnectPolicy;
pub use endpoint::{DEFAULT_ENDPOINT, endpoint_url, validate_endpoint};
pub use listeners::{ListenerRegistry, MessageListener, MessageStream};
pub use live::LiveTransport;
pub use options::{LiveOptions, SimulatedOptions};
pub use probe::{DEFAULT_PROBE_TIMEOUT, probe_endpoint};
pub use simulated::SimulatedTransport;
pub use state::ConnectionState;

// ============================================================================
// Transport
// ============================================================================

/// Capability set shared by every transport.
///
/// Callers hold an `Arc<dyn Transport>` and never need to know which
/// implementation is behind it.
///
/// # Example
///
/// ```ignore
/// use ws_fallback::{AuthResponse, Message, Transport};
///
/// async fn login(transport: &dyn Transport) -> ws_fallback::Result<()> {
///     transport.connect().await?;
///     transport.add_message_listener(Box::new(|message: &Message| {
///         if let Ok(response) = AuthResponse::from_message(message) {
///             println!("authenticated: {}", response.success);
///         }
///     }));
///     transport.send(Message::auth_request("admin", "password"))
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Opens the connection.
    ///
    /// Resolves once the transport is `Open`; a no-op if it already is.
    ///
    /// # Errors
    ///
    /// - [`Error::EndpointUnreachable`](crate::Error::EndpointUnreachable) if nothing accepts the connection
    /// - [`Error::ConnectionTimeout`](crate::Error::ConnectionTimeout) if the handshake is too slow
    /// - [`Error::Connection`](crate::Error::Connection) for other handshake failures
    /// - [`Error::InvalidState`](crate::Error::InvalidState) if a connect is already in progress
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) if `disconnect()` interrupted it
    async fn connect(&self) -> Result<()>;

    /// Sends a message.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`](crate::Error::NotConnected) unless the transport is `Open`;
    ///   the message is dropped, not queued
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) if the connection died
    ///   before the frame could be queued
    fn send(&self, message: Message) -> Result<()>;

    /// Sends a `{type, payload}` message.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    fn send_message(&self, message_type: &str, payload: Value) -> Result<()> {
        self.send(Message::new(message_type, payload))
    }

    /// Appends a listener for inbound messages.
    ///
    /// Listeners run in registration order and are dropped by
    /// [`disconnect`](Self::disconnect).
    fn add_message_listener(&self, listener: MessageListener) -> SubscriptionId;

    /// Removes a listener. Returns `false` if it was not registered.
    fn remove_message_listener(&self, id: SubscriptionId) -> bool;

    /// Returns a stream of inbound messages that ends at `disconnect()`.
    fn messages(&self) -> MessageStream;

    /// Closes the connection on request.
    ///
    /// Cancels pending timers and clears listeners; no listener runs after
    /// this returns. Idempotent.
    fn disconnect(&self);

    /// Returns the current connection state.
    fn state(&self) -> ConnectionState;

    /// Returns `true` if the transport is `Open`.
    #[inline]
    fn is_connected(&self) -> bool {
        self.state().is_open()
    }

    /// Returns the endpoint URL this transport was created for.
    fn endpoint(&self) -> &str;
}
