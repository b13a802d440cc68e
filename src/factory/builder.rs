//! Builder pattern for factory configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use ws_fallback::TransportFactory;
//!
//! # fn example() -> ws_fallback::Result<()> {
//! let factory = TransportFactory::builder()
//!     .probe_timeout(Duration::from_millis(500))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::Result;
use crate::transport::{LiveOptions, ReconnectPolicy, SimulatedOptions};

use super::core::TransportFactory;
use super::options::FactoryOptions;

// ============================================================================
// FactoryBuilder
// ============================================================================

/// Builder for configuring a [`TransportFactory`].
///
/// Use [`TransportFactory::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct FactoryBuilder {
    options: FactoryOptions,
}

impl FactoryBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bound on the reachability probe.
    #[inline]
    #[must_use]
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.options.probe_timeout = timeout;
        self
    }

    /// Sets the reconnection policy of live transports.
    #[inline]
    #[must_use]
    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.options.live.reconnect = policy;
        self
    }

    /// Sets the options of live transports.
    #[inline]
    #[must_use]
    pub fn live(mut self, live: LiveOptions) -> Self {
        self.options.live = live;
        self
    }

    /// Sets the options of simulated transports.
    #[inline]
    #[must_use]
    pub fn simulated(mut self, simulated: SimulatedOptions) -> Self {
        self.options.simulated = simulated;
        self
    }

    /// Replaces every option at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: FactoryOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the factory with validation.
    ///
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) if the probe timeout is zero
    /// or the live options are invalid.
    pub fn build(self) -> Result<TransportFactory> {
        self.options.validate()?;
        Ok(TransportFactory::from_options(self.options))
    }
}

// ============================================================================
// Tests
// ============================================================================
