//! Offline stand-in for the backend.
//!
//! Implements [`Transport`] without touching the network. `connect()`
//! succeeds after a fixed latency; `auth_request` is answered with a
//! synthesized `auth_response` after a fixed processing delay; every other
//! message type is accepted and ignored.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::identifiers::SubscriptionId;
use crate::protocol::{AUTH_REQUEST, AuthRequest, AuthResponse, AuthUser, Message};

use super::listeners::{ListenerRegistry, MessageListener, MessageStream};
use super::options::SimulatedOptions;
use super::state::{ConnectionState, StateCell};
use super::task::{CancelGuard, ScheduledTask};
use super::Transport;

// ============================================================================
// SimulatedTransport
// ============================================================================

/// Transport that fakes the backend locally.
pub struct SimulatedTransport {
    inner: Arc<SimulatedInner>,
}

struct SimulatedInner {
    url: String,
    options: SimulatedOptions,
    listeners: Arc<ListenerRegistry>,
    core: Mutex<SimulatedCore>,
}

#[derive(Default)]
struct SimulatedCore {
    state: StateCell,
    /// Bumped by `disconnect()`.
    epoch: u64,
    /// Responses not yet delivered.
    pending: Vec<ScheduledTask>,
}

impl SimulatedTransport {
    /// Creates a simulated transport with default options.
    ///
    /// `url` is only reported back by [`Transport::endpoint`].
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_options(url, SimulatedOptions::default())
    }

    /// Creates a simulated transport with custom options.
    #[must_use]
    pub fn with_options(url: impl Into<String>, options: SimulatedOptions) -> Self {
        Self {
            inner: Arc::new(SimulatedInner {
                url: url.into(),
                options,
                listeners: ListenerRegistry::new(),
                core: Mutex::new(SimulatedCore::default()),
            }),
        }
    }

    /// Returns the options in use.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SimulatedOptions {
        &self.inner.options
    }

    /// Returns the number of registered listeners.
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Returns the number of responses scheduled but not yet delivered.
    #[must_use]
    pub fn pending_responses(&self) -> usize {
        let mut core = self.inner.core.lock();
        core.pending.retain(|task| !task.is_finished());
        core.pending.len()
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
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
            core.state.transition(ConnectionState::Connecting);
            core.epoch
        };

        let pending = CancelGuard::new(move || self.inner.abandon_connect(epoch));
        sleep(self.inner.options.connect_latency).await;
        pending.complete();

        let mut core = self.inner.core.lock();
        if core.epoch != epoch {
            debug!("Simulated connect interrupted by disconnect");
            return Err(Error::ConnectionClosed);
        }
        core.state.transition(ConnectionState::Open);

        info!(url = %self.inner.url, "Simulated connection established");
        Ok(())
    }

    fn send(&self, message: Message) -> Result<()> {
        let mut core = self.inner.core.lock();
        let state = core.state.get();
        if !state.is_open() {
            warn!(
                %state,
                message_type = message.message_type(),
                "Send rejected: simulated transport is not open"
            );
            return Err(Error::not_connected(state));
        }

        debug!(message_type = message.message_type(), "Simulated send");

        if !message.is(AUTH_REQUEST) {
            trace!(message_type = message.message_type(), "No simulated reply for message type");
            return Ok(());
        }

        let inner = Arc::clone(&self.inner);
        let generation = self.inner.listeners.generation();
        let (_, payload) = message.into_parts();

        core.pending.retain(|task| !task.is_finished());
        core.pending.push(ScheduledTask::after(
            self.inner.options.response_latency,
            async move { inner.respond(generation, &payload) },
        ));

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

impl fmt::Debug for SimulatedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.core.lock();
        f.debug_struct("SimulatedTransport")
            .field("url", &self.inner.url)
            .field("state", &core.state.get())
            .field("pending", &core.pending.len())
            .field("listeners", &self.inner.listeners)
            .finish()
    }
}

impl Drop for SimulatedTransport {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

// ============================================================================
// SimulatedInner
// ============================================================================

impl SimulatedInner {
    /// Checks credentials and builds the verdict.
    fn authenticate(&self, payload: &Value) -> AuthResponse {
        let Ok(request) = AuthRequest::deserialize(payload) else {
            return AuthResponse::rejected("Malformed auth request");
        };

        if request != self.options.credentials {
            debug!(username = %request.username, "Simulated login rejected");
            return AuthResponse::rejected("Invalid credentials");
        }

        let token = format!("sim-token-{}", Uuid::new_v4().simple());
        let user = AuthUser {
            id: self.options.user_id,
            username: request.username,
            role: self.options.role.clone(),
        };

        debug!(username = %user.username, "Simulated login accepted");
        AuthResponse::accepted(token, user)
    }

    /// Delivers the `auth_response` for `payload` to every listener.
    fn respond(&self, generation: u64, payload: &Value) {
        let message = match self.authenticate(payload).into_message() {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Failed to build simulated response");
                return;
            }
        };

        let delivered = self.listeners.dispatch(generation, &message);
        trace!(delivered, "Simulated auth_response dispatched");
    }

    /// Rolls back a `connect()` whose future was dropped during the latency.
    fn abandon_connect(&self, epoch: u64) {
        let mut core = self.core.lock();
        if core.epoch != epoch || core.state.get() != ConnectionState::Connecting {
            return;
        }
        core.epoch += 1;
        core.state.transition(ConnectionState::Disconnected);
        debug!("Simulated connect abandoned by caller");
    }

    /// Cancels pending responses, clears listeners, marks disconnected.
    fn shutdown(&self) {
        let previous = {
            let mut core = self.core.lock();
            core.epoch += 1;
            for task in core.pending.drain(..) {
                task.cancel();
            }
            let previous = core.state.get();
            core.state.transition(ConnectionState::Disconnected);
            previous
        };

        self.listeners.clear();

        if previous != ConnectionState::Disconnected {
            info!(url = %self.url, "Simulated transport disconnected");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use futures_util::StreamExt;
    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio_test::assert_ok;

    use crate::protocol::AUTH_RESPONSE;
    use crate::transport::endpoint::DEFAULT_ENDPOINT;

    fn recording_listener(
        transport: &SimulatedTransport,
        name: &'static str,
        log: &mpsc::UnboundedSender<(&'static str, Message)>,
    ) {
        let log = log.clone();
        transport.add_message_listener(Box::new(move |message: &Message| {
            let _ = log.send((name, message.clone()));
        }));
    }

    async fn connected() -> SimulatedTransport {
        let transport = SimulatedTransport::new(DEFAULT_ENDPOINT);
        assert_ok!(transport.connect().await);
        transport
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_takes_simulated_latency() {
        let transport = SimulatedTransport::new(DEFAULT_ENDPOINT);
        let start = tokio::time::Instant::now();

        assert_ok!(transport.connect().await);

        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(transport.state(), ConnectionState::Open);
        assert_eq!(transport.endpoint(), DEFAULT_ENDPOINT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_credentials_succeed() {
        let transport = connected().await;
        let mut stream = transport.messages();

        assert_ok!(transport.send(Message::auth_request("admin", "password")));

        let message = stream.next().await.expect("response");
        assert!(message.is(AUTH_RESPONSE));
        let response = AuthResponse::from_message(&message).expect("decode");
        assert!(response.success);
        assert!(response.token.as_deref().is_some_and(|t| !t.is_empty()));
        assert_eq!(
            response.user,
            Some(AuthUser {
                id: 1,
                username: "admin".into(),
                role: "admin".into(),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokens_are_fresh() {
        let transport = connected().await;
        let mut stream = transport.messages();

        transport.send(Message::auth_request("admin", "password")).expect("send");
        transport.send(Message::auth_request("admin", "password")).expect("send");

        let first = AuthResponse::from_message(&stream.next().await.expect("first")).expect("decode");
        let second =
            AuthResponse::from_message(&stream.next().await.expect("second")).expect("decode");
        assert_ne!(first.token, second.token);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_credentials_fail_with_null_token() {
        let transport = connected().await;
        let mut stream = transport.messages();

        for (username, password) in [("admin", "wrong"), ("root", "password"), ("", "")] {
            transport
                .send(Message::auth_request(username, password))
                .expect("send");

            let message = stream.next().await.expect("response");
            assert_eq!(message.payload()["success"], json!(false));
            assert_eq!(message.payload()["token"], Value::Null);
            assert_eq!(message.payload()["message"], "Invalid credentials");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_auth_payload_is_rejected() {
        let transport = connected().await;
        let mut stream = transport.messages();

        transport
            .send_message(AUTH_REQUEST, json!({"user": "admin"}))
            .expect("send");

        let response = AuthResponse::from_message(&stream.next().await.expect("response"))
            .expect("decode");
        assert!(!response.success);
        assert!(response.token.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_waits_for_processing_latency() {
        let transport = connected().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        recording_listener(&transport, "a", &tx);

        transport.send(Message::auth_request("admin", "password")).expect("send");

        sleep(Duration::from_millis(900)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(transport.pending_responses(), 1);

        sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_ok());
        assert_eq!(transport.pending_responses(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listeners_called_in_registration_order() {
        let transport = connected().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        recording_listener(&transport, "first", &tx);
        recording_listener(&transport, "second", &tx);
        recording_listener(&transport, "third", &tx);

        transport.send(Message::auth_request("admin", "password")).expect("send");
        sleep(Duration::from_millis(1100)).await;

        let order: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|(name, _)| name)
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_types_get_no_reply() {
        let transport = connected().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        recording_listener(&transport, "a", &tx);

        assert_ok!(transport.send_message("user_list", json!({})));
        assert_eq!(transport.pending_responses(), 0);

        sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_before_connect_fails() {
        let transport = SimulatedTransport::new(DEFAULT_ENDPOINT);
        let err = transport
            .send(Message::auth_request("admin", "password"))
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_response() {
        let transport = connected().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        recording_listener(&transport, "a", &tx);
        drop(tx);

        transport.send(Message::auth_request("admin", "password")).expect("send");
        sleep(Duration::from_millis(500)).await;

        transport.disconnect();
        transport.disconnect();

        assert_eq!(transport.state(), ConnectionState::Disconnected);
        assert_eq!(transport.listener_count(), 0);
        assert_eq!(transport.pending_responses(), 0);

        sleep(Duration::from_secs(2)).await;
        // Channel closed with nothing delivered.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_during_connect() {
        let transport = Arc::new(SimulatedTransport::new(DEFAULT_ENDPOINT));

        let connecting = {
            let transport = Arc::clone(&transport);
            tokio::spawn(async move { transport.connect().await })
        };

        sleep(Duration::from_millis(100)).await;
        assert_eq!(transport.state(), ConnectionState::Connecting);
        transport.disconnect();

        let result = connecting.await.expect("join");
        assert!(matches!(result, Err(Error::ConnectionClosed)));
        assert_eq!(transport.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_connect_rolls_back() {
        let transport = SimulatedTransport::new(DEFAULT_ENDPOINT);

        let dropped = tokio::time::timeout(Duration::from_millis(100), transport.connect()).await;
        assert!(dropped.is_err());
        assert_eq!(transport.state(), ConnectionState::Disconnected);

        assert_ok!(transport.connect().await);
        assert_eq!(transport.state(), ConnectionState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_credentials() {
        let options = SimulatedOptions::new()
            .with_credentials("demo", "demo")
            .with_role("viewer")
            .with_connect_latency(Duration::from_millis(10))
            .with_response_latency(Duration::from_millis(10));
        let transport = SimulatedTransport::with_options(DEFAULT_ENDPOINT, options);
        transport.connect().await.expect("connect");
        let mut stream = transport.messages();

        transport.send(Message::auth_request("demo", "demo")).expect("send");
        let response = AuthResponse::from_message(&stream.next().await.expect("response"))
            .expect("decode");
        assert!(response.success);
        assert_eq!(response.user.map(|u| u.role), Some("viewer".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_after_disconnect_restarts_stream() {
        let transport = connected().await;
        let mut old = transport.messages();
        transport.disconnect();
        assert!(old.next().await.is_none());

        assert_ok!(transport.connect().await);
        let mut fresh = transport.messages();
        transport.send(Message::auth_request("admin", "password")).expect("send");
        assert!(fresh.next().await.is_some());
    }
}
