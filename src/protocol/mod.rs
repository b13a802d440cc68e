//! WebSocket protocol message types.
//!
//! This module defines the JSON envelope exchanged with the backend and the
//! typed payloads of the authentication exchange.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Payload |
//! |--------------|-----------|---------|
//! | `auth_request` | Client → Server | [`AuthRequest`] |
//! | `auth_response` | Server → Client | [`AuthResponse`] |
//!
//! Any other `type` is forwarded untouched.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | `{type, payload}` envelope and frame parsing |
//! | `auth` | Authentication payloads |

// ============================================================================
// Submodules
// ============================================================================

/// Authentication payloads.
pub mod auth;

/// Message envelope.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{AuthRequest, AuthResponse, AuthUser};
pub use message::{AUTH_REQUEST, AUTH_RESPONSE, Message};
