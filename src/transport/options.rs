//! Transport configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use ws_fallback::transport::{LiveOptions, ReconnectPolicy, SimulatedOptions};
//!
//! let live = LiveOptions::new()
//!     .with_reconnect(ReconnectPolicy::default().with_max_attempts(3))
//!     .with_connect_timeout(Duration::from_secs(5));
//!
//! let simulated = SimulatedOptions::new()
//!     .with_credentials("demo", "demo")
//!     .with_response_latency(Duration::from_millis(200));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::AuthRequest;

use super::backoff::ReconnectPolicy;

// ============================================================================
// Constants
// ============================================================================

/// Default handshake timeout for [`LiveTransport::connect`](super::LiveTransport).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Simulated handshake latency.
pub const SIMULATED_CONNECT_LATENCY: Duration = Duration::from_millis(500);

/// Simulated server processing time for `auth_request`.
pub const SIMULATED_RESPONSE_LATENCY: Duration = Duration::from_millis(1000);

/// Username accepted by the simulated backend.
pub const SIMULATED_USERNAME: &str = "admin";

/// Password accepted by the simulated backend.
pub const SIMULATED_PASSWORD: &str = "password";

// ============================================================================
// LiveOptions
// ============================================================================

/// Options for [`LiveTransport`](super::LiveTransport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveOptions {
    /// Automatic reconnection policy.
    pub reconnect: ReconnectPolicy,

    /// Upper bound on each handshake; `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,
}

impl Default for LiveOptions {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
        }
    }
}

impl LiveOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reconnection policy.
    #[inline]
    #[must_use]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Removes the handshake timeout.
    #[inline]
    #[must_use]
    pub fn without_connect_timeout(mut self) -> Self {
        self.connect_timeout = None;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the reconnect policy is unusable or the connect
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        self.reconnect.validate()?;
        if self.connect_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::config("connect timeout must be non-zero"));
        }
        Ok(())
    }
}

// ============================================================================
// SimulatedOptions
// ============================================================================

/// Options for [`SimulatedTransport`](super::SimulatedTransport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedOptions {
    /// Delay before `connect()` resolves.
    pub connect_latency: Duration,

    /// Delay before a synthesized `auth_response` is delivered.
    pub response_latency: Duration,

    /// The one credential pair that authenticates.
    pub credentials: AuthRequest,

    /// ID of the synthetic user record.
    pub user_id: u64,

    /// Role of the synthetic user record.
    pub role: String,
}

impl Default for SimulatedOptions {
    fn default() -> Self {
        Self {
            connect_latency: SIMULATED_CONNECT_LATENCY,
            response_latency: SIMULATED_RESPONSE_LATENCY,
            credentials: AuthRequest::new(SIMULATED_USERNAME, SIMULATED_PASSWORD),
            user_id: 1,
            role: "admin".to_string(),
        }
    }
}

impl SimulatedOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the simulated handshake latency.
    #[inline]
    #[must_use]
    pub fn with_connect_latency(mut self, latency: Duration) -> Self {
        self.connect_latency = latency;
        self
    }

    /// Sets the simulated response latency.
    #[inline]
    #[must_use]
    pub fn with_response_latency(mut self, latency: Duration) -> Self {
        self.response_latency = latency;
        self
    }

    /// Sets the accepted credential pair.
    #[inline]
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = AuthRequest::new(username, password);
        self
    }

    /// Sets the synthetic user's role.
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
