//! Connection manager for the multiplexed party channel.
//!
//! [`ConnectionManager`] owns the single WebSocket shared by every device in a
//! session. A background task reads frames, routes `SUBSCRIBE` and
//! `UNSUBSCRIBE` envelopes into the [`DeviceRegistry`], hands replies to the
//! [`RequestCorrelator`], and writes the correlator's outbound frames.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ConnectionManager                        │
//! │                                                               │
//! │  ┌────────────────┐        ┌───────────────────────────────┐  │
//! │  │ Correlator     │        │ Background Task                │  │
//! │  │                │        │                                │  │
//! │  │ send_action() ─┼─frame─▶│ WebSocket read/write loop      │  │
//! │  │                │  chan  │                                │  │
//! │  │ complete()   ◀─┼────────│ Route: reply → correlator      │  │
//! │  └────────────────┘        │        (un)subscribe → registry│  │
//! │                            │        other → DeviceMessage   │  │
//! │  events() ◀──broadcast─────│ Closure → reset, reconnect     │  │
//! │                            └───────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reconnection uses a fixed delay and never gives up; only
//! [`ConnectionManager::disconnect`] (or dropping the manager) stops it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use phonecloud_core::prelude::*;
use phonecloud_core::SessionEvent;

use crate::correlator::{RequestCorrelator, RequestIdGenerator};
use crate::protocol::{build_endpoint, parse_envelope, CompletionPayload, InboundMessage};
use crate::registry::DeviceRegistry;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Delay between a closure and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Maximum time to wait for one WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the session event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Lifecycle of the multiplexed transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport; a reconnect may be pending.
    Closed,
    /// A connection attempt is in progress.
    Connecting,
    /// Connected and exchanging frames.
    Open,
    /// Teardown requested; the Close frame is being sent.
    Closing,
}

/// Settings for one [`ConnectionManager`].
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Base WebSocket URL, without query string.
    pub endpoint: String,
    /// Access credential sent as `Access-Token`.
    pub access_token: String,
    pub reconnect_delay: Duration,
    /// Upper bound on one handshake; a stalled attempt counts as failed.
    pub connect_timeout: Duration,
    /// Fail in-flight requests when the transport closes instead of letting
    /// them run into their deadlines.
    pub fail_pending_on_disconnect: bool,
    pub request_ids: RequestIdGenerator,
}

impl ConnectionConfig {
    pub fn new(endpoint: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: access_token.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            fail_pending_on_disconnect: false,
            request_ids: RequestIdGenerator::default(),
        }
    }
}

/// Ensures at most one reconnect is scheduled at a time.
///
/// Any number of closure observations may call [`schedule`](Self::schedule);
/// only the first one after the previous attempt fired gets `true`.
#[derive(Debug, Default)]
pub struct ReconnectGuard {
    pending: AtomicBool,
}

impl ReconnectGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the pending reconnect slot. Returns `false` if one is already
    /// scheduled.
    pub fn schedule(&self) -> bool {
        !self.pending.swap(true, Ordering::SeqCst)
    }

    /// Release the slot once the scheduled attempt starts.
    pub fn fire(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// WebSocket type alias
// ---------------------------------------------------------------------------

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

// ---------------------------------------------------------------------------
// ConnectionManager
// ---------------------------------------------------------------------------

/// Owns the session's multiplexed connection.
///
/// Create with [`ConnectionManager::connect`]. Use [`correlator`] to send
/// actions and [`events`] to observe connection and subscription changes.
///
/// [`correlator`]: Self::correlator
/// [`events`]: Self::events
pub struct ConnectionManager {
    correlator: RequestCorrelator,
    state: Arc<RwLock<ConnectionState>>,
    guard: Arc<ReconnectGuard>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.connection_state())
            .field("correlator", &self.correlator)
            .finish()
    }
}

impl ConnectionManager {
    /// Open the transport for the devices in `registry` and start the
    /// background task.
    ///
    /// Emits [`SessionEvent::Connected`] on `events` before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid or the first connection
    /// attempt fails. Later failures are retried indefinitely.
    pub async fn connect(
        config: ConnectionConfig,
        registry: DeviceRegistry,
        events: broadcast::Sender<SessionEvent>,
    ) -> Result<Self> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let correlator =
            RequestCorrelator::new(registry, outbound_tx, events, config.request_ids);

        let link = Link {
            config,
            correlator: correlator.clone(),
            state: Arc::new(RwLock::new(ConnectionState::Connecting)),
            guard: Arc::new(ReconnectGuard::new()),
        };

        // Attempt the first connection before returning so callers know
        // whether the endpoint and credential are usable.
        let ws_stream = match link.open().await {
            Ok(ws) => ws,
            Err(err) => {
                link.set_state(ConnectionState::Closed);
                return Err(err);
            }
        };
        link.on_open();

        let state = Arc::clone(&link.state);
        let guard = Arc::clone(&link.guard);
        let task = tokio::spawn(run_client_task(link, ws_stream, outbound_rx, shutdown_rx));

        Ok(Self {
            correlator,
            state,
            guard,
            shutdown_tx,
            task: Mutex::new(Some(task)),
        })
    }

    /// Clonable handle for sending actions over this connection.
    pub fn correlator(&self) -> RequestCorrelator {
        self.correlator.clone()
    }

    pub fn registry(&self) -> &DeviceRegistry {
        self.correlator.registry()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.correlator.events()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_open(&self) -> bool {
        self.connection_state() == ConnectionState::Open
    }

    /// Whether a reconnect attempt is currently scheduled.
    pub fn reconnect_pending(&self) -> bool {
        self.guard.is_pending()
    }

    /// Close the transport, stop reconnecting and fail in-flight requests.
    ///
    /// Waits for the background task to finish. Calling this twice is
    /// harmless.
    pub async fn disconnect(&self) {
        {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            if *guard != ConnectionState::Closed {
                *guard = ConnectionState::Closing;
            }
        }
        let _ = self.shutdown_tx.send(true);

        let task = self
            .task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!("Link: background task ended abnormally: {}", err);
            }
        }

        *self.state.write().unwrap_or_else(|e| e.into_inner()) = ConnectionState::Closed;
        self.correlator.cancel_all("Session stopped");
    }
}

// ---------------------------------------------------------------------------
// Shared background state
// ---------------------------------------------------------------------------

/// State shared between the manager and its background task.
struct Link {
    config: ConnectionConfig,
    correlator: RequestCorrelator,
    state: Arc<RwLock<ConnectionState>>,
    guard: Arc<ReconnectGuard>,
}

impl Link {
    fn set_state(&self, state: ConnectionState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.correlator.event_sender().send(event);
    }

    fn registry(&self) -> &DeviceRegistry {
        self.correlator.registry()
    }

    /// Build the endpoint from the current device set and connect.
    async fn open(&self) -> Result<WsStream> {
        self.set_state(ConnectionState::Connecting);
        let device_ids = self.registry().connectable_ids();
        let url = build_endpoint(
            &self.config.endpoint,
            &self.config.access_token,
            &device_ids,
        )?;
        info!(
            "Link: connecting to {} for {} device(s)",
            self.config.endpoint,
            device_ids.len()
        );
        match tokio::time::timeout(self.config.connect_timeout, connect_ws(url.as_str())).await {
            Ok(result) => result,
            Err(_) => Err(Error::transport(format!(
                "Connection timed out after {} ms",
                self.config.connect_timeout.as_millis()
            ))),
        }
    }

    fn on_open(&self) {
        self.set_state(ConnectionState::Open);
        // The server re-announces every live subscription after open
        self.registry().reset_subscriptions();
        info!("Link: connection open");
        self.emit(SessionEvent::Connected);
    }

    fn on_closed(&self, reason: Option<String>) {
        self.set_state(ConnectionState::Closed);
        self.registry().reset_subscriptions();
        warn!(
            "Link: connection closed ({})",
            reason.as_deref().unwrap_or("no reason")
        );
        self.emit(SessionEvent::Disconnected { reason });

        if self.config.fail_pending_on_disconnect {
            self.correlator.cancel_all("Connection lost");
        }
    }

    /// Route one inbound text frame.
    fn handle_text(&self, text: &str) {
        match parse_envelope(text) {
            InboundMessage::Subscribe(payload) => {
                self.registry().upsert_from_subscribe(&payload);
                debug!(
                    "Link: {} subscribed as {}",
                    payload.device_id, payload.subscription_id
                );
                self.emit(SessionEvent::DeviceSubscribed {
                    device_id: payload.device_id,
                    subscription_id: payload.subscription_id,
                });
            }
            InboundMessage::Unsubscribe(payload) => {
                self.registry().clear_from_unsubscribe(&payload);
                debug!("Link: {} unsubscribed", payload.device_id);
                self.emit(SessionEvent::DeviceUnsubscribed {
                    device_id: payload.device_id,
                });
            }
            InboundMessage::Message(payload) => {
                if let Some(completion) = CompletionPayload::from_message(&payload) {
                    if self.correlator.complete(completion) {
                        return;
                    }
                }
                self.emit(SessionEvent::DeviceMessage { payload });
            }
            InboundMessage::Unknown(raw) => {
                let preview: String = raw.chars().take(120).collect();
                debug!("Link: ignoring unknown frame: {}", preview);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Background task
// ---------------------------------------------------------------------------

/// Why one connection's I/O loop ended.
enum LoopExit {
    /// Teardown was requested.
    Shutdown,
    /// The transport closed or failed unexpectedly.
    Lost(Option<String>),
}

/// Entry point for the background WebSocket I/O task.
///
/// Accepts the already-open stream of the first connection, then reconnects
/// after every unexpected closure until shutdown.
async fn run_client_task(
    link: Link,
    ws_stream: WsStream,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ws_stream = ws_stream;

    loop {
        match run_io_loop(ws_stream, &link, &mut outbound_rx, &mut shutdown_rx).await {
            LoopExit::Shutdown => break,
            LoopExit::Lost(reason) => link.on_closed(reason),
        }

        match reconnect(&link, &mut outbound_rx, &mut shutdown_rx).await {
            Some(ws) => {
                link.on_open();
                ws_stream = ws;
            }
            None => break,
        }
    }

    link.set_state(ConnectionState::Closed);
    debug!("Link: background task exiting");
}

/// Retry at a fixed interval until a connection opens or shutdown is
/// requested. Returns `None` on shutdown.
async fn reconnect(
    link: &Link,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> Option<WsStream> {
    let delay = link.config.reconnect_delay;
    let mut attempt: u32 = 1;

    loop {
        if link.guard.schedule() {
            link.emit(SessionEvent::ReconnectScheduled {
                delay_ms: delay.as_millis() as u64,
            });
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_rx.changed() => return None,
        }
        link.guard.fire();

        if *shutdown_rx.borrow() {
            return None;
        }

        // Frames queued for the old connection carry stale subscription ids
        let mut stale = 0usize;
        while outbound_rx.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            debug!("Link: discarded {} frame(s) queued while closed", stale);
        }

        let opened = tokio::select! {
            result = link.open() => result,
            _ = shutdown_rx.changed() => return None,
        };

        match opened {
            Ok(ws) => {
                info!("Link: reconnected (attempt {})", attempt);
                return Some(ws);
            }
            Err(err) => {
                link.set_state(ConnectionState::Closed);
                warn!("Link: reconnect attempt {} failed: {}", attempt, err);
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

/// Run one connection's read/write select loop.
async fn run_io_loop(
    ws_stream: WsStream,
    link: &Link,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> LoopExit {
    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    loop {
        tokio::select! {
            // ── Incoming WebSocket message ───────────────────────────────
            frame = ws_stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        link.handle_text(text.as_str());
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.as_str().to_string())
                            .filter(|r| !r.is_empty());
                        debug!("Link: received Close frame");
                        return LoopExit::Lost(reason.or_else(|| Some("closed by server".into())));
                    }
                    Some(Ok(_)) => {
                        // Ping/Pong/Binary: ignore
                    }
                    Some(Err(err)) => {
                        return LoopExit::Lost(Some(format!("read error: {}", err)));
                    }
                    None => {
                        return LoopExit::Lost(Some("stream ended".into()));
                    }
                }
            }

            // ── Outgoing frame from the correlator ───────────────────────
            frame = outbound_rx.recv() => {
                match frame {
                    Some(text) => {
                        if let Err(err) = ws_sink.send(WsMessage::Text(text.into())).await {
                            return LoopExit::Lost(Some(format!("write error: {}", err)));
                        }
                    }
                    None => {
                        send_close(&mut ws_sink).await;
                        return LoopExit::Shutdown;
                    }
                }
            }

            // ── Teardown ─────────────────────────────────────────────────
            _ = shutdown_rx.changed() => {
                send_close(&mut ws_sink).await;
                return LoopExit::Shutdown;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Establish a new WebSocket connection to `url`.
async fn connect_ws(url: &str) -> Result<WsStream> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|err| Error::transport(format!("Failed to connect: {err}")))?;
    Ok(ws_stream)
}

/// Send a WebSocket Close frame, ignoring any write errors.
async fn send_close(ws_sink: &mut SplitSink<WsStream, WsMessage>) {
    let _ = ws_sink.send(WsMessage::Close(None)).await;
    let _ = ws_sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_guard_single_slot() {
        let guard = ReconnectGuard::new();
        assert!(!guard.is_pending());

        assert!(guard.schedule());
        assert!(!guard.schedule());
        assert!(!guard.schedule());
        assert!(guard.is_pending());

        guard.fire();
        assert!(!guard.is_pending());
        assert!(guard.schedule());
    }

    #[test]
    fn test_reconnect_guard_concurrent_closures_schedule_once() {
        let guard = Arc::new(ReconnectGuard::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                std::thread::spawn(move || guard.schedule())
            })
            .collect();

        let scheduled = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(scheduled, 1);
    }

    #[test]
    fn test_connection_config_defaults() {
        let config = ConnectionConfig::new("wss://example.com/ws/party", "token");
        assert_eq!(config.reconnect_delay, Duration::from_millis(1000));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(!config.fail_pending_on_disconnect);
        assert_eq!(config.request_ids, RequestIdGenerator::Uuid);
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_endpoint_fails() {
        let registry = DeviceRegistry::new();
        let (events, _) = broadcast::channel(8);
        let config = ConnectionConfig::new("ws://127.0.0.1:1/ws/party", "token");

        let err = ConnectionManager::connect(config, registry, events)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[tokio::test]
    async fn test_connect_times_out_on_stalled_handshake() {
        // Accepts TCP but never answers the upgrade
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let registry = DeviceRegistry::new();
        let (events, _) = broadcast::channel(8);
        let mut config = ConnectionConfig::new(format!("ws://{}/ws/party", addr), "token");
        config.connect_timeout = Duration::from_millis(100);

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            ConnectionManager::connect(config, registry, events),
        )
        .await
        .expect("connect should give up on its own")
        .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_endpoint() {
        let registry = DeviceRegistry::new();
        let (events, _) = broadcast::channel(8);
        let config = ConnectionConfig::new("not a url", "token");

        let err = ConnectionManager::connect(config, registry, events)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
