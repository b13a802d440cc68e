//! Local WebSocket server and helpers for transport tests.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

// ============================================================================
// TestServer
// ============================================================================

/// Instruction for one accepted server-side connection.
enum ServerCommand {
    /// Write a text frame.
    Text(String),
    /// Drop the socket without a closing handshake.
    Kill,
}

/// WebSocket server on `127.0.0.1:0` that records inbound frames and can
/// push frames or kill connections on demand.
pub(crate) struct TestServer {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    connections: Arc<Mutex<Vec<mpsc::UnboundedSender<ServerCommand>>>>,
    received: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
    accept_task: JoinHandle<()>,
}

impl TestServer {
    /// Binds and starts accepting.
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let accepted = Arc::new(AtomicUsize::new(0));
        let connections = Arc::new(Mutex::new(Vec::new()));
        let (received_tx, received_rx) = mpsc::unbounded_channel();

        let accept_task = tokio::spawn(Self::accept_loop(
            listener,
            Arc::clone(&accepted),
            Arc::clone(&connections),
            received_tx,
        ));

        Self {
            addr,
            accepted,
            connections,
            received: tokio::sync::Mutex::new(received_rx),
            accept_task,
        }
    }

    async fn accept_loop(
        listener: TcpListener,
        accepted: Arc<AtomicUsize>,
        connections: Arc<Mutex<Vec<mpsc::UnboundedSender<ServerCommand>>>>,
        received_tx: mpsc::UnboundedSender<String>,
    ) {
        while let Ok((stream, _)) = listener.accept().await {
            let Ok(ws_stream) = accept_async(stream).await else {
                continue;
            };

            let (command_tx, command_rx) = mpsc::unbounded_channel();
            connections.lock().push(command_tx);
            accepted.fetch_add(1, Ordering::SeqCst);

            tokio::spawn(Self::serve(ws_stream, command_rx, received_tx.clone()));
        }
    }

    async fn serve(
        ws_stream: tokio_tungstenite::WebSocketStream<TcpStream>,
        mut command_rx: mpsc::UnboundedReceiver<ServerCommand>,
        received_tx: mpsc::UnboundedSender<String>,
    ) {
        let (mut write, mut read) = ws_stream.split();
        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        let _ = received_tx.send(text.to_string());
                    }
                    Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                },
                command = command_rx.recv() => match command {
                    Some(ServerCommand::Text(text)) => {
                        if write.send(WsMessage::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(ServerCommand::Kill) | None => break,
                },
            }
        }
    }

    /// Returns the `ws://` URL of this server.
    pub(crate) fn url(&self) -> String {
        format!("ws://{}/ws/users", self.addr)
    }

    /// Number of WebSocket handshakes completed so far.
    pub(crate) fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Writes a raw text frame on every live connection.
    pub(crate) fn push(&self, text: &str) {
        self.connections
            .lock()
            .retain(|tx| tx.send(ServerCommand::Text(text.to_string())).is_ok());
    }

    /// Drops every live connection without a closing handshake.
    pub(crate) fn kill_connections(&self) {
        for tx in self.connections.lock().drain(..) {
            let _ = tx.send(ServerCommand::Kill);
        }
    }

    /// Stops accepting; new connections are refused.
    pub(crate) fn stop_accepting(&self) {
        self.accept_task.abort();
    }

    /// Waits for the next frame received from a client.
    pub(crate) async fn next_received(&self) -> Option<String> {
        let mut received = self.received.lock().await;
        timeout(Duration::from_secs(5), received.recv())
            .await
            .ok()
            .flatten()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.accept_task.abort();
        self.kill_connections();
    }
}

// ============================================================================
// FlakyServer
// ============================================================================

/// Endpoint that completes the first `healthy` handshakes and then drops
/// those sockets without a closing handshake; every later connection is
/// dropped before the handshake. Records when each connection arrived.
pub(crate) struct FlakyServer {
    addr: SocketAddr,
    arrivals: Arc<Mutex<Vec<Instant>>>,
    accept_task: JoinHandle<()>,
}

impl FlakyServer {
    pub(crate) async fn start(healthy: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let arrivals = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&arrivals);
        let accept_task = tokio::spawn(async move {
            let mut served = 0;
            while let Ok((stream, _)) = listener.accept().await {
                log.lock().push(Instant::now());
                if served < healthy {
                    served += 1;
                    if let Ok(ws_stream) = accept_async(stream).await {
                        drop(ws_stream);
                    }
                } else {
                    drop(stream);
                }
            }
        });

        Self {
            addr,
            arrivals,
            accept_task,
        }
    }

    pub(crate) fn url(&self) -> String {
        format!("ws://{}/ws/users", self.addr)
    }

    /// Arrival time of every TCP connection so far.
    pub(crate) fn arrivals(&self) -> Vec<Instant> {
        self.arrivals.lock().clone()
    }
}

impl Drop for FlakyServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns a `ws://` URL on a port nobody listens on.
pub(crate) async fn unused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("ws://{addr}/ws/users")
}

/// Binds a TCP listener that never completes a WebSocket handshake.
///
/// Keep the returned listener alive for as long as the endpoint should hang.
pub(crate) async fn silent_listener() -> (String, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    (format!("ws://{addr}/ws/users"), listener)
}

/// Polls `condition` every 10ms until it holds or 5s pass.
pub(crate) async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Awaits `future`, failing the test after 5s.
pub(crate) async fn within<F: Future>(future: F) -> F::Output {
    timeout(Duration::from_secs(5), future)
        .await
        .expect("operation timed out")
}
