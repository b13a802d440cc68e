//! ws-fallback - WebSocket session transport with offline fallback.
//!
//! This library gives a client one connection abstraction for talking to a
//! user-management backend over WebSocket, and a stand-in that answers the
//! login exchange locally when the backend cannot be reached.
//!
//! # Architecture
//!
//! - **[`LiveTransport`]**: Real WebSocket with an event loop and bounded,
//!   exponentially backed-off reconnection
//! - **[`SimulatedTransport`]**: Same contract, no network; answers
//!   `auth_request` after a fixed latency
//! - **[`TransportFactory`]**: Probes the endpoint once and memoizes the
//!   chosen implementation for the rest of the session
//!
//! Callers work only with `Arc<dyn Transport>`.
//!
//! # Quick Start
//!
//! ```no_run
//! use ws_fallback::{AuthResponse, DEFAULT_ENDPOINT, Message, Result, TransportFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let factory = TransportFactory::new();
//!     let transport = factory.create_service(DEFAULT_ENDPOINT).await?;
//!     transport.connect().await?;
//!
//!     let mut messages = transport.messages();
//!     transport.send(Message::auth_request("admin", "password"))?;
//!
//!     while let Some(message) = messages.recv().await {
//!         if let Ok(response) = AuthResponse::from_message(&message) {
//!             println!("login ok: {}", response.success);
//!             break;
//!         }
//!     }
//!
//!     transport.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`factory`] | Transport selection and memoization |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Message envelope and auth payloads |
//! | [`transport`] | Transport contract and implementations |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Transport selection.
///
/// Use [`TransportFactory::new()`] or [`TransportFactory::builder()`].
pub mod factory;

/// Type-safe identifiers.
pub mod identifiers;

/// WebSocket protocol message types.
pub mod protocol;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Factory types
pub use factory::{FactoryBuilder, FactoryOptions, TransportFactory, TransportKind};

// Identifier types
pub use identifiers::SubscriptionId;

// Protocol types
pub use protocol::{AUTH_REQUEST, AUTH_RESPONSE, AuthRequest, AuthResponse, AuthUser, Message};

// Transport types
pub use transport::{
    ConnectionState, DEFAULT_ENDPOINT, LiveOptions, LiveTransport, MessageListener, MessageStream,
    ReconnectPolicy, SimulatedOptions, SimulatedTransport, Transport,
};
