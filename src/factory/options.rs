//! Factory configuration.
//!
//! ```ignore
//! use std::time::Duration;
//! use ws_fallback::{FactoryOptions, LiveOptions, ReconnectPolicy};
//!
//! let options = FactoryOptions::new()
//!     .with_probe_timeout(Duration::from_millis(500))
//!     .with_live(LiveOptions::new().with_reconnect(ReconnectPolicy::disabled()));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::{DEFAULT_PROBE_TIMEOUT, LiveOptions, SimulatedOptions};

// ============================================================================
// FactoryOptions
// ============================================================================

/// Settings the factory applies to the probe and to the transport it builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryOptions {
    /// Bound on the reachability probe.
    pub probe_timeout: Duration,

    /// Options handed to a [`LiveTransport`](crate::LiveTransport).
    pub live: LiveOptions,

    /// Options handed to a [`SimulatedTransport`](crate::SimulatedTransport).
    pub simulated: SimulatedOptions,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            live: LiveOptions::default(),
            simulated: SimulatedOptions::default(),
        }
    }
}

impl FactoryOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the probe timeout.
    #[inline]
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the live transport options.
    #[inline]
    #[must_use]
    pub fn with_live(mut self, live: LiveOptions) -> Self {
        self.live = live;
        self
    }

    /// Sets the simulated transport options.
    #[inline]
    #[must_use]
    pub fn with_simulated(mut self, simulated: SimulatedOptions) -> Self {
        self.simulated = simulated;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the probe timeout is zero or the live options
    /// are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.probe_timeout.is_zero() {
            return Err(Error::config("probe timeout must be non-zero"));
        }
        self.live.validate()
    }
}

// ============================================================================
// Tests
// ============================================================================
