//! Ordered subscriber registry and message streams.
//!
//! Both transports fan inbound messages out through a [`ListenerRegistry`]:
//! listeners run synchronously, in registration order, on the task that
//! received the message.
//!
//! # Cancellation
//!
//! [`ListenerRegistry::clear`] and [`ListenerRegistry::dispatch`] serialize
//! on a reentrant gate. Once `clear` returns, no dispatch is in progress and
//! none started before the clear can still deliver. Listeners may call back
//! into the transport (including `disconnect`) from the same thread.

// ============================================================================
// Imports
// ============================================================================

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures_util::Stream;
use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::mpsc;
use tracing::{debug, error, trace};

use crate::identifiers::SubscriptionId;
use crate::protocol::Message;

// ============================================================================
// Types
// ============================================================================

/// Message listener callback type.
///
/// Called once per inbound message. Must not block: it runs on the same
/// task as the connection's I/O and timers.
pub type MessageListener = Box<dyn Fn(&Message) + Send + Sync>;

/// Shared form stored in the registry so dispatch can snapshot it.
type SharedListener = Arc<dyn Fn(&Message) + Send + Sync>;

// ============================================================================
// ListenerRegistry
// ============================================================================

/// Ordered collection of message subscribers for one transport instance.
#[derive(Default)]
pub struct ListenerRegistry {
    /// Serializes dispatch against clear.
    gate: ReentrantMutex<()>,
    /// Subscribers in registration order, plus the current generation.
    inner: Mutex<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    generation: u64,
    listeners: Vec<(SubscriptionId, SharedListener)>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Appends a listener, returning its handle.
    pub fn add(&self, listener: MessageListener) -> SubscriptionId {
        let id = SubscriptionId::next();
        let mut inner = self.inner.lock();
        inner.listeners.push((id, Arc::from(listener)));
        trace!(%id, count = inner.listeners.len(), "Listener added");
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        let removed = inner.listeners.len() != before;

        if removed {
            trace!(%id, "Listener removed");
        }
        removed
    }

    /// Returns the number of registered listeners.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Returns `true` if no listener is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current generation.
    ///
    /// Producers capture it when they start and pass it to [`dispatch`]; a
    /// [`clear`] in between makes their deliveries no-ops.
    ///
    /// [`dispatch`]: Self::dispatch
    /// [`clear`]: Self::clear
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Drops every listener and starts a new generation.
    ///
    /// Blocks until any in-progress dispatch on another thread finishes.
    pub fn clear(&self) {
        let _gate = self.gate.lock();
        let dropped = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            std::mem::take(&mut inner.listeners)
        };

        if !dropped.is_empty() {
            debug!(count = dropped.len(), "Listeners cleared");
        }
        // Dropped outside the inner lock: stream senders close here.
        drop(dropped);
    }

    /// Delivers `message` to every listener of `generation`, in order.
    ///
    /// Returns the number of listeners invoked. A panicking listener is
    /// logged and skipped; the rest still run. If a listener clears the
    /// registry, the listeners after it are not called.
    pub fn dispatch(&self, generation: u64, message: &Message) -> usize {
        let _gate = self.gate.lock();

        let snapshot: Vec<_> = {
            let inner = self.inner.lock();
            if inner.generation != generation {
                trace!(
                    stale = generation,
                    current = inner.generation,
                    "Dropping message from stale generation"
                );
                return 0;
            }
            inner.listeners.clone()
        };

        let mut delivered = 0;
        for (id, listener) in &snapshot {
            // A listener may have cleared the registry on this thread.
            if self.inner.lock().generation != generation {
                trace!(remaining = snapshot.len() - delivered, "Registry cleared mid-dispatch");
                break;
            }
            delivered += 1;
            if catch_unwind(AssertUnwindSafe(|| listener(message))).is_err() {
                error!(%id, message_type = message.message_type(), "Message listener panicked");
            }
        }

        delivered
    }

    /// Subscribes a channel-backed [`MessageStream`].
    ///
    /// The stream ends when the registry is cleared and unsubscribes itself
    /// when dropped.
    #[must_use]
    pub fn stream(self: &Arc<Self>) -> MessageStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.add(Box::new(move |message: &Message| {
            let _ = tx.send(message.clone());
        }));

        MessageStream {
            id,
            receiver: rx,
            registry: Arc::downgrade(self),
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ListenerRegistry")
            .field("generation", &inner.generation)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

// ============================================================================
// MessageStream
// ============================================================================

/// Lazy sequence of inbound messages for one connection.
///
/// Yields messages in arrival order and returns `None` after the transport
/// is disconnected. Call `messages()` again after a fresh `connect()` to
/// start a new sequence. Dropping the stream unsubscribes it.
#[derive(Debug)]
pub struct MessageStream {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<Message>,
    registry: Weak<ListenerRegistry>,
}

impl MessageStream {
    /// Returns the subscription backing this stream.
    #[inline]
    #[must_use]
    pub fn subscription_id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next message.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }
}

impl Stream for MessageStream {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
