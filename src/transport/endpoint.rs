//! Endpoint URL helpers.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Endpoint used when the caller does not name one.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8081/ws/users";

/// Path served by the backend's user channel.
pub const USERS_PATH: &str = "/ws/users";

// ============================================================================
// Functions
// ============================================================================

/// Builds `ws(s)://{host}:{port}/ws/users`.
#[must_use]
pub fn endpoint_url(host: &str, port: u16, secure: bool) -> String {
    let scheme = if secure { "wss" } else { "ws" };
    format!("{scheme}://{host}:{port}{USERS_PATH}")
}

/// Parses `url` and checks it is a `ws://` or `wss://` URL with a host.
///
/// # Errors
///
/// [`Error::InvalidUrl`] if the URL does not parse, has another scheme, or
/// has no host.
pub fn validate_endpoint(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::invalid_url(url, e.to_string()))?;

    match parsed.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(Error::invalid_url(
                url,
                format!("scheme must be ws or wss, got '{other}'"),
            ));
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::invalid_url(url, "missing host"));
    }

    Ok(parsed)
}

// ============================================================================
// Tests
// ============================================================================
