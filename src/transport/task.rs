//! Owned, cancellable delayed tasks.
//!
//! Reconnection timers and simulated responses are [`ScheduledTask`]s held
//! by the transport that scheduled them. Cancelling (or dropping) the handle
//! aborts the task; combined with the registry generation check this
//! guarantees no callback fires after `disconnect()` returns.
//!
//! [`CancelGuard`] covers the other direction: a caller dropping a pending
//! `connect()` future.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;

// ============================================================================
// ScheduledTask
// ============================================================================

/// A future scheduled to run after a delay, aborted on cancel or drop.
///
/// Must be created inside a Tokio runtime.
#[derive(Debug)]
pub(crate) struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Spawns `task` to run once `delay` has elapsed.
    pub(crate) fn after<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        trace!(delay_ms = delay.as_millis() as u64, "Task scheduled");
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            task.await;
        });
        Self { handle }
    }

    /// Aborts the task if it has not completed yet.
    #[inline]
    pub(crate) fn cancel(&self) {
        self.handle.abort();
    }

    /// Returns `true` once the task has completed or been aborted.
    #[inline]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// CancelGuard
// ============================================================================

/// Runs `on_cancel` if dropped before [`complete`](Self::complete).
///
/// Held across the await points of an operation that must undo its
/// bookkeeping when the caller drops the future.
pub(crate) struct CancelGuard<F: FnOnce()> {
    on_cancel: Option<F>,
}

impl<F: FnOnce()> CancelGuard<F> {
    #[inline]
    pub(crate) fn new(on_cancel: F) -> Self {
        Self {
            on_cancel: Some(on_cancel),
        }
    }

    /// Marks the operation as finished; `on_cancel` will not run.
    #[inline]
    pub(crate) fn complete(mut self) {
        self.on_cancel = None;
    }
}

impl<F: FnOnce()> Drop for CancelGuard<F> {
    fn drop(&mut self) {
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
