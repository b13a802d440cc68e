//! Transport selection and memoization.
//!
//! The [`TransportFactory`] probes the endpoint once, picks a live or
//! simulated transport and hands the same instance to every caller until
//! [`reset`](TransportFactory::reset) is called.
//!
//! # Example
//!
//! ```ignore
//! use ws_fallback::{DEFAULT_ENDPOINT, TransportFactory};
//!
//! # async fn example() -> ws_fallback::Result<()> {
//! let factory = TransportFactory::new();
//! let transport = factory.create_service(DEFAULT_ENDPOINT).await?;
//!
//! if factory.is_simulated() {
//!     println!("backend offline, running in demo mode");
//! }
//! transport.connect().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::transport::{
    LiveTransport, SimulatedTransport, Transport, probe_endpoint, validate_endpoint,
};

use super::builder::FactoryBuilder;
use super::options::FactoryOptions;

// ============================================================================
// TransportKind
// ============================================================================

/// Which implementation the factory selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Network-backed [`LiveTransport`].
    Live,
    /// Offline [`SimulatedTransport`].
    Simulated,
}

impl TransportKind {
    /// Returns the lowercase name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Simulated => "simulated",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Types
// ============================================================================

/// Memoized outcome of one probe.
#[derive(Debug)]
struct Selection {
    transport: Arc<dyn Transport>,
    kind: TransportKind,
}

impl Selection {
    fn live(transport: LiveTransport) -> Self {
        Self {
            transport: Arc::new(transport),
            kind: TransportKind::Live,
        }
    }

    fn simulated(transport: SimulatedTransport) -> Self {
        Self {
            transport: Arc::new(transport),
            kind: TransportKind::Simulated,
        }
    }
}

// ============================================================================
// TransportFactory
// ============================================================================

/// Selects and memoizes the transport for a session.
///
/// The factory is an ordinary value: create one at startup and share it
/// (by reference or inside an `Arc`) with everything that needs a
/// transport.
///
/// # Selection
///
/// The first [`create_service`](Self::create_service) call probes the URL.
/// A handshake within the probe timeout selects a [`LiveTransport`];
/// anything else selects a [`SimulatedTransport`]. Concurrent first calls
/// share one probe and receive the same instance.
#[derive(Debug)]
pub struct TransportFactory {
    options: FactoryOptions,
    slot: Mutex<Arc<OnceCell<Selection>>>,
    probes: AtomicUsize,
}

impl Default for TransportFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportFactory {
    /// Creates a factory with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_options(FactoryOptions::default())
    }

    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::new()
    }

    /// Creates a factory from options that were already validated.
    pub(crate) fn from_options(options: FactoryOptions) -> Self {
        Self {
            options,
            slot: Mutex::new(Arc::new(OnceCell::new())),
            probes: AtomicUsize::new(0),
        }
    }

    /// Returns the factory options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &FactoryOptions {
        &self.options
    }

    /// Returns the session transport, selecting it on first use.
    ///
    /// Once a transport is memoized, `url` is ignored and the same instance
    /// is returned until [`reset`](Self::reset). The transport is returned
    /// unconnected.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`](crate::Error::InvalidUrl) if no transport is
    ///   memoized yet and `url` is not a `ws://` or `wss://` URL. Nothing is
    ///   cached and the probe does not run.
    pub async fn create_service(&self, url: &str) -> Result<Arc<dyn Transport>> {
        let cell = Arc::clone(&*self.slot.lock());

        if let Some(selection) = cell.get() {
            return Ok(Arc::clone(&selection.transport));
        }

        let selection = cell.get_or_try_init(|| self.select(url)).await?;
        Ok(Arc::clone(&selection.transport))
    }

    /// Probes `url` and builds the matching transport.
    async fn select(&self, url: &str) -> Result<Selection> {
        validate_endpoint(url)?;

        self.probes.fetch_add(1, Ordering::SeqCst);
        debug!(url, "Selecting transport");

        match probe_endpoint(url, self.options.probe_timeout).await {
            Ok(()) => {
                let transport = LiveTransport::with_options(url, self.options.live.clone())?;
                info!(url, "Backend reachable, using live transport");
                Ok(Selection::live(transport))
            }
            Err(e) => {
                warn!(url, error = %e, "Backend unreachable, using simulated transport");
                let transport = SimulatedTransport::with_options(url, self.options.simulated.clone());
                Ok(Selection::simulated(transport))
            }
        }
    }

    /// Returns the memoized transport, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<dyn Transport>> {
        self.slot
            .lock()
            .get()
            .map(|selection| Arc::clone(&selection.transport))
    }

    /// Returns which implementation was selected, if any.
    #[must_use]
    pub fn kind(&self) -> Option<TransportKind> {
        self.slot.lock().get().map(|selection| selection.kind)
    }

    /// Returns `true` if the memoized transport is simulated.
    ///
    /// `false` before the first successful [`create_service`](Self::create_service).
    #[inline]
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.kind() == Some(TransportKind::Simulated)
    }

    /// Number of probes run since the factory was created.
    #[inline]
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Forgets the memoized transport and disconnects it.
    ///
    /// The next [`create_service`](Self::create_service) probes again.
    pub fn reset(&self) {
        let previous = std::mem::replace(&mut *self.slot.lock(), Arc::new(OnceCell::new()));

        if let Some(selection) = previous.get() {
            info!(kind = %selection.kind, "Resetting transport factory");
            selection.transport.disconnect();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
