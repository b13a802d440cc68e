//! Authentication payloads.
//!
//! # Format
//!
//! `auth_request` (client → server):
//! ```json
//! { "username": "admin", "password": "password" }
//! ```
//!
//! `auth_response` (server → client):
//! ```json
//! {
//!   "success": true,
//!   "message": "Login successful",
//!   "token": "opaque",
//!   "user": { "id": 1, "username": "admin", "role": "admin" }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::message::{AUTH_REQUEST, AUTH_RESPONSE, Message};

// ============================================================================
// AuthRequest
// ============================================================================

/// Credential pair carried by `auth_request`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

impl AuthRequest {
    /// Creates a credential pair.
    #[inline]
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// AuthUser
// ============================================================================

/// User record returned on successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Numeric user ID.
    pub id: u64,
    /// Login name.
    pub username: String,
    /// Role name, e.g. `admin`.
    pub role: String,
}

// ============================================================================
// AuthResponse
// ============================================================================

/// Verdict carried by `auth_response`.
///
/// `token` and `user` serialize as `null` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Whether the credentials were accepted.
    pub success: bool,

    /// Human-readable outcome.
    #[serde(default)]
    pub message: Option<String>,

    /// Session token (success only).
    #[serde(default)]
    pub token: Option<String>,

    /// Authenticated user (success only).
    #[serde(default)]
    pub user: Option<AuthUser>,
}

impl AuthResponse {
    /// Creates a successful response.
    #[must_use]
    pub fn accepted(token: impl Into<String>, user: AuthUser) -> Self {
        Self {
            success: true,
            message: Some("Login successful".to_string()),
            token: Some(token.into()),
            user: Some(user),
        }
    }

    /// Creates a rejection with the given reason.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            token: None,
            user: None,
        }
    }

    /// Extracts the response from an `auth_response` message.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the message has another type
    /// - [`Error::Json`] if the payload has the wrong shape
    pub fn from_message(message: &Message) -> Result<Self> {
        if !message.is(AUTH_RESPONSE) {
            return Err(Error::protocol(format!(
                "expected '{AUTH_RESPONSE}', got '{}'",
                message.message_type()
            )));
        }
        message.decode_payload()
    }

    /// Wraps the response into an `auth_response` message.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if serialization fails.
    pub fn into_message(self) -> Result<Message> {
        Message::with_payload(AUTH_RESPONSE, &self)
    }
}

// ============================================================================
// Message Helpers
// ============================================================================

impl Message {
    /// Creates an `auth_request` message.
    #[must_use]
    pub fn auth_request(username: impl Into<String>, password: impl Into<String>) -> Self {
        let username: String = username.into();
        let password: String = password.into();
        Self::new(
            AUTH_REQUEST,
            serde_json::json!({ "username": username, "password": password }),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
