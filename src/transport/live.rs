//! Network-backed transport with automatic reconnection.
//!
//! # Event Loop
//!
//! Each open connection spawns a tokio task that handles:
//!
//! - Incoming text frames (parsed and fanned out to listeners)
//! - Outgoing frames queued by [`Transport::send`]
//! - Shutdown requested by [`Transport::disconnect`]
//!
//! # Reconnection
//!
//! When the loop ends without a shutdown request the close is unclean and
//! the transport schedules a retry following its [`ReconnectPolicy`]. Each
//! connection cycle carries an epoch; `disconnect()` (or an explicit
//! `connect()`) starts a new epoch, which makes every task from the old one
//! inert.
//!
//! [`ReconnectPolicy`]: super::ReconnectPolicy

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::SubscriptionId;
use crate::protocol::Message;

use super::endpoint::validate_endpoint;
use super::listeners::{ListenerRegistry, MessageListener, MessageStream};
use super::options::LiveOptions;
use super::state::{ConnectionState, StateCell};
use super::task::{CancelGuard, ScheduledTask};
use super::Transport;

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a serialized text frame.
    Send(String),
    /// Send a Close frame and stop.
    Shutdown,
}

// ============================================================================
// LiveTransport
// ============================================================================

/// WebSocket transport to a real backend.
///
/// Dropping the transport disconnects it.
pub struct LiveTransport {
    inner: Arc<LiveInner>,
}

/// State shared with the event loop and reconnection tasks.
struct LiveInner {
    url: String,
    options: LiveOptions,
    listeners: Arc<ListenerRegistry>,
    core: Mutex<LiveCore>,
}

/// Mutable connection bookkeeping, guarded by one lock.
#[derive(Default)]
struct LiveCore {
    state: StateCell,
    /// Bumped by `connect()` and `disconnect()`.
    epoch: u64,
    /// Automatic attempts since the last successful open.
    attempts: u32,
    /// Command channel of the running event loop.
    outbound: Option<mpsc::UnboundedSender<ConnectionCommand>>,
    /// Pending reconnection timer.
    reconnect: Option<ScheduledTask>,
}

impl LiveTransport {
    /// Creates a transport for `url` with default options.
    ///
    /// Does not connect.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] if `url` is not a `ws://`/`wss://` URL.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_options(url, LiveOptions::default())
    }

    /// Creates a transport for `url` with custom options.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `url` is not a `ws://`/`wss://` URL
    /// - [`Error::Config`] if the options are invalid
    pub fn with_options(url: impl Into<String>, options: LiveOptions) -> Result<Self> {
        let url = url.into();
        validate_endpoint(&url)?;
        options.validate()?;

        Ok(Self {
            inner: Arc::new(LiveInner {
                url,
                options,
                listeners: ListenerRegistry::new(),
                core: Mutex::new(LiveCore::default()),
            }),
        })
    }

    /// Returns the options in use.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &LiveOptions {
        &self.inner.options
    }

    /// Returns the automatic attempts made since the last successful open.
    #[inline]
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.core.lock().attempts
    }

    /// Returns the number of registered listeners.
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

#[async_trait]
impl Transport for LiveTransport {
    async fn connect(&self) -> Result<()> {
        let epoch = {
            let mut core = self.inner.core.lock();
            match core.state.get() {
                ConnectionState::Open => return Ok(()),
                state @ ConnectionState::Connecting => {
                    return Err(Error::invalid_state("connect", state));
                }
                _ => {}
            }

            if let Some(task) = core.reconnect.take() {
                debug!("Explicit connect supersedes pending reconnection");
                task.cancel();
            }
            core.epoch += 1;
            core.state.transition(ConnectionState::Connecting);
            core.epoch
        };

        info!(url = %self.inner.url, "Connecting");

        let pending = CancelGuard::new(move || self.inner.abandon_connect(epoch));
        let result = self.inner.open(epoch).await;
        pending.complete();

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                let mut core = self.inner.core.lock();
                if core.epoch == epoch {
                    core.state.transition(ConnectionState::Closed);
                }
                warn!(url = %self.inner.url, error = %e, "Connect failed");
                Err(e)
            }
        }
    }

    fn send(&self, message: Message) -> Result<()> {
        let text = message.to_text()?;

        let core = self.inner.core.lock();
        let state = core.state.get();
        let outbound = match (&core.outbound, state.is_open()) {
            (Some(outbound), true) => outbound,
            _ => {
                warn!(
                    %state,
                    message_type = message.message_type(),
                    "Send rejected: transport is not open"
                );
                return Err(Error::not_connected(state));
            }
        };

        outbound
            .send(ConnectionCommand::Send(text))
            .map_err(|_| Error::ConnectionClosed)?;

        trace!(message_type = message.message_type(), "Message queued");
        Ok(())
    }

    fn add_message_listener(&self, listener: MessageListener) -> SubscriptionId {
        self.inner.listeners.add(listener)
    }

    fn remove_message_listener(&self, id: SubscriptionId) -> bool {
        self.inner.listeners.remove(id)
    }

    fn messages(&self) -> MessageStream {
        self.inner.listeners.stream()
    }

    fn disconnect(&self) {
        self.inner.shutdown();
    }

    fn state(&self) -> ConnectionState {
        self.inner.core.lock().state.get()
    }

    fn endpoint(&self) -> &str {
        &self.inner.url
    }
}

impl fmt::Debug for LiveTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.core.lock();
        f.debug_struct("LiveTransport")
            .field("url", &self.inner.url)
            .field("state", &core.state.get())
            .field("attempts", &core.attempts)
            .field("listeners", &self.inner.listeners)
            .finish()
    }
}

impl Drop for LiveTransport {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

// ============================================================================
// LiveInner - Lifecycle
// ============================================================================

impl LiveInner {
    /// Performs the WebSocket handshake, bounded by the connect timeout.
    async fn handshake(&self) -> Result<WsStream> {
        let connecting = connect_async(self.url.as_str());

        let result = match self.options.connect_timeout {
            Some(limit) => timeout(limit, connecting)
                .await
                .map_err(|_| Error::connection_timeout(limit.as_millis() as u64))?,
            None => connecting.await,
        };

        let (ws_stream, _response) = result.map_err(|e| Error::from_handshake(&self.url, e))?;
        Ok(ws_stream)
    }

    /// Handshakes and, if `epoch` is still current, starts the event loop.
    async fn open(self: &Arc<Self>, epoch: u64) -> Result<()> {
        let ws_stream = self.handshake().await?;

        let mut core = self.core.lock();
        if core.epoch != epoch {
            debug!(url = %self.url, "Handshake finished for a superseded connection");
            return Err(Error::ConnectionClosed);
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let generation = self.listeners.generation();

        tokio::spawn(Self::run_event_loop(
            Arc::clone(self),
            ws_stream,
            command_rx,
            epoch,
            generation,
        ));

        core.outbound = Some(command_tx);
        core.attempts = 0;
        core.state.transition(ConnectionState::Open);

        info!(url = %self.url, "WebSocket connection established");
        Ok(())
    }

    /// Rolls back a `connect()` whose future was dropped mid-handshake.
    fn abandon_connect(&self, epoch: u64) {
        let mut core = self.core.lock();
        if core.epoch != epoch || core.state.get() != ConnectionState::Connecting {
            return;
        }
        core.epoch += 1;
        core.state.transition(ConnectionState::Disconnected);
        debug!(url = %self.url, "Connect abandoned by caller");
    }

    /// Schedules the next automatic attempt, or gives up.
    ///
    /// Called after an unclean close or a failed attempt of `epoch`.
    fn schedule_reconnect(self: &Arc<Self>, epoch: u64) {
        let mut core = self.core.lock();
        if core.epoch != epoch {
            return;
        }

        core.outbound = None;
        let policy = self.options.reconnect;

        match policy.next_delay(core.attempts) {
            Some(delay) => {
                core.attempts += 1;
                core.state.transition(ConnectionState::Reconnecting);

                info!(
                    url = %self.url,
                    attempt = core.attempts,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling reconnection"
                );

                core.reconnect = Some(ScheduledTask::after(
                    delay,
                    Self::reconnect_attempt(Arc::clone(self), epoch),
                ));
            }
            None => {
                core.reconnect = None;
                core.state.transition(ConnectionState::Closed);
                warn!(
                    url = %self.url,
                    attempts = core.attempts,
                    "Reconnection budget exhausted; connection closed"
                );
            }
        }
    }

    /// One automatic reconnection attempt.
    fn reconnect_attempt(inner: Arc<Self>, epoch: u64) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            match inner.open(epoch).await {
                Ok(()) => info!(url = %inner.url, "Reconnected"),
                Err(e) => {
                    warn!(url = %inner.url, error = %e, "Reconnection attempt failed");
                    inner.schedule_reconnect(epoch);
                }
            }
        })
    }

    /// Clean close: cancels timers, stops the loop, clears listeners.
    fn shutdown(&self) {
        let previous = {
            let mut core = self.core.lock();
            core.epoch += 1;

            if let Some(task) = core.reconnect.take() {
                task.cancel();
            }
            if let Some(outbound) = core.outbound.take() {
                let _ = outbound.send(ConnectionCommand::Shutdown);
            }

            let previous = core.state.get();
            core.state.transition(ConnectionState::Disconnected);
            previous
        };

        self.listeners.clear();

        if previous != ConnectionState::Disconnected {
            info!(url = %self.url, from = %previous, "Disconnected");
        }
    }
}

// ============================================================================
// LiveInner - Event Loop
// ============================================================================

impl LiveInner {
    /// Event loop that handles WebSocket I/O for one connection.
    async fn run_event_loop(
        inner: Arc<Self>,
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        epoch: u64,
        generation: u64,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let clean = loop {
            tokio::select! {
                // Incoming frames from the backend
                frame = ws_read.next() => {
                    match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            inner.handle_incoming_frame(text.as_str(), generation);
                        }

                        Some(Ok(WsMessage::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by remote");
                            break false;
                        }

                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket error");
                            break false;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break false;
                        }

                        // Ignore Binary, Ping, Pong
                        Some(Ok(_)) => {}
                    }
                }

                // Commands from the transport
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(text)) => {
                            if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                                warn!(error = %e, "Failed to write frame");
                                break false;
                            }
                        }

                        Some(ConnectionCommand::Shutdown) | None => {
                            debug!("Shutdown requested");
                            let _ = ws_write.close().await;
                            break true;
                        }
                    }
                }
            }
        };

        if clean {
            debug!("Event loop terminated");
        } else {
            inner.schedule_reconnect(epoch);
        }
    }

    /// Parses one inbound text frame and fans it out.
    fn handle_incoming_frame(&self, text: &str, generation: u64) {
        match Message::from_text(text) {
            Ok(message) => {
                trace!(message_type = message.message_type(), "Message received");
                self.listeners.dispatch(generation, &message);
            }
            Err(e) => {
                warn!(error = %e, len = text.len(), "Dropping malformed frame");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
