//! One-shot connectivity probe.
//!
//! Opens a transient WebSocket to the endpoint, closes it straight away and
//! reports whether the handshake finished within the timeout. The probe
//! socket is never handed to a transport.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tracing::{debug, trace};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default bound on the probe handshake.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(2000);

// ============================================================================
// Functions
// ============================================================================

/// Checks that a WebSocket handshake with `url` completes within `limit`.
///
/// # Errors
///
/// - [`Error::ConnectionTimeout`] if the handshake is too slow
/// - [`Error::EndpointUnreachable`] if nothing accepts the connection
/// - [`Error::Connection`] for any other handshake failure
pub async fn probe_endpoint(url: &str, limit: Duration) -> Result<()> {
    trace!(url, timeout_ms = limit.as_millis() as u64, "Probing endpoint");

    let (mut ws_stream, _response) = timeout(limit, connect_async(url))
        .await
        .map_err(|_| Error::connection_timeout(limit.as_millis() as u64))?
        .map_err(|e| Error::from_handshake(url, e))?;

    // Teardown failures do not change the verdict.
    if let Err(e) = ws_stream.close(None).await {
        trace!(error = %e, "Probe socket close failed");
    }

    debug!(url, "Probe succeeded");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
