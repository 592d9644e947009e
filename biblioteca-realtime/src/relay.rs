//! Reconnecting WebSocket relay.

use crate::config::RelayConfig;
use crate::error::{RealtimeError, RealtimeResult};
use crate::message::{RealtimeMessage, SYSTEM_MESSAGE};
use crate::status::{ReadyState, RelayStatus};
use biblioteca_events::{EventBus, EventLevel, LoanEventType, LoanPayload, NewEvent, SystemPayload};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::{Value, json};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};
use tungstenite::Message;
use url::Url;

/// How long `disconnect` waits for the close handshake.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type LocalCallback = Arc<dyn Fn(&RealtimeMessage) + Send + Sync>;
type LocalHandlers = DashMap<String, Vec<(u64, LocalCallback)>>;

enum Outbound {
    Text(String),
    Close,
}

enum ConnectionEnd {
    /// Closed by `disconnect`
    Requested,
    /// Closed by the server or the network
    Lost,
}

struct Shared {
    bus: EventBus,
    config: RwLock<RelayConfig>,
    status: watch::Sender<RelayStatus>,
    outgoing: Mutex<Option<mpsc::UnboundedSender<Outbound>>>,
    handlers: Arc<LocalHandlers>,
    next_handler_id: AtomicU64,
    stopping: AtomicBool,
}

#[derive(Default)]
struct SupervisorSlot(Option<JoinHandle<()>>);

impl SupervisorSlot {
    fn replace(&mut self, handle: JoinHandle<()>) -> Option<JoinHandle<()>> {
        self.0.replace(handle)
    }

    fn take(&mut self) -> Option<JoinHandle<()>> {
        self.0.take()
    }

    fn is_running(&self) -> bool {
        self.0.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for SupervisorSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}

/// WebSocket client that republishes server-pushed frames on the event bus.
///
/// Inbound JSON frames `{type, payload, timestamp, id}` are routed by type
/// prefix: `LOAN_*` frames are republished unchanged, `SYSTEM_*` frames are
/// republished through [`EventBus::publish_system`]. Frames that do not parse
/// are logged and dropped; the connection stays open.
///
/// When the connection closes or an attempt fails, the relay reconnects
/// after `reconnect_interval`, up to `max_reconnect_attempts` times in a row.
/// After that it publishes one terminal `SYSTEM_ERROR` event and stays
/// [`RelayStatus::Exhausted`] until [`connect`](Self::connect) is called
/// again.
#[derive(Clone)]
pub struct RealtimeRelay {
    shared: Arc<Shared>,
    supervisor: Arc<Mutex<SupervisorSlot>>,
}

impl RealtimeRelay {
    /// Create a disconnected relay publishing into `bus`.
    pub fn new(config: RelayConfig, bus: EventBus) -> Self {
        let (status, _) = watch::channel(RelayStatus::Disconnected);
        Self {
            shared: Arc::new(Shared {
                bus,
                config: RwLock::new(config),
                status,
                outgoing: Mutex::new(None),
                handlers: Arc::new(LocalHandlers::new()),
                next_handler_id: AtomicU64::new(1),
                stopping: AtomicBool::new(false),
            }),
            supervisor: Arc::new(Mutex::new(SupervisorSlot::default())),
        }
    }

    /// Connect, resetting the reconnect counter.
    ///
    /// Resolves with the outcome of the first attempt; on failure the relay
    /// keeps retrying in the background. Returns `Ok` at once when already
    /// connected. While an attempt is in flight, further calls wait for that
    /// attempt instead of starting another one.
    pub async fn connect(&self) -> RealtimeResult<()> {
        let first_rx = {
            let mut supervisor = self.supervisor.lock();
            match self.status() {
                RelayStatus::Connected => {
                    debug!("Relay already connected");
                    return Ok(());
                }
                RelayStatus::Connecting if supervisor.is_running() => None,
                _ => {
                    if let Some(previous) = supervisor.take() {
                        previous.abort();
                    }
                    self.shared.stopping.store(false, Ordering::SeqCst);
                    self.shared.set_status(RelayStatus::Connecting);

                    let (first_tx, first_rx) = oneshot::channel();
                    supervisor.replace(tokio::spawn(supervise(self.shared.clone(), first_tx)));
                    Some(first_rx)
                }
            }
        };

        match first_rx {
            Some(first_rx) => first_rx.await.unwrap_or(Err(RealtimeError::Cancelled)),
            None => self.join_attempt().await,
        }
    }

    async fn join_attempt(&self) -> RealtimeResult<()> {
        debug!("Connection attempt in progress; waiting for it");
        let mut status = self.watch_status();
        let settled = match status.wait_for(|s| *s != RelayStatus::Connecting).await {
            Ok(settled) => *settled,
            Err(_) => return Err(RealtimeError::Cancelled),
        };

        match settled {
            RelayStatus::Connected => Ok(()),
            RelayStatus::Closing | RelayStatus::Disconnected => Err(RealtimeError::Cancelled),
            other => Err(RealtimeError::AttemptFailed(other)),
        }
    }

    /// Close the connection and stop reconnecting.
    ///
    /// Clears relay-local subscriptions. Bus subscriptions are untouched.
    pub async fn disconnect(&self) {
        self.shared.stopping.store(true, Ordering::SeqCst);
        self.shared.handlers.clear();

        let handle = self.supervisor.lock().take();
        let sender = self.shared.outgoing.lock().take();

        if let Some(mut handle) = handle {
            match sender {
                Some(sender) => {
                    self.shared.set_status(RelayStatus::Closing);
                    let _ = sender.send(Outbound::Close);
                    if tokio::time::timeout(CLOSE_GRACE, &mut handle).await.is_err() {
                        handle.abort();
                    }
                }
                None => handle.abort(),
            }
        }

        self.shared.set_status(RelayStatus::Disconnected);
        info!("Realtime relay disconnected");
    }

    /// Send a frame, stamped with `timestamp` and a `ws_` id.
    ///
    /// Returns the frame sent, or `None` (with a warning) when not connected.
    pub fn send(&self, message_type: impl Into<String>, payload: Value) -> Option<RealtimeMessage> {
        let message = RealtimeMessage::outbound(message_type, payload);

        let Some(sender) = self.shared.outgoing.lock().clone() else {
            warn!(message_type = %message.message_type, "Relay not connected; message dropped");
            return None;
        };

        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to serialize outbound message");
                return None;
            }
        };

        if sender.send(Outbound::Text(text)).is_err() {
            warn!(message_type = %message.message_type, "Connection closed; message dropped");
            return None;
        }
        Some(message)
    }

    /// Send a loan event frame.
    pub fn send_loan_event(&self, kind: LoanEventType, payload: &LoanPayload) -> Option<RealtimeMessage> {
        self.send(kind.as_str(), serde_json::to_value(payload).unwrap_or_default())
    }

    /// Send a `SYSTEM_MESSAGE` frame.
    pub fn send_system_event(
        &self,
        message: impl Into<String>,
        level: EventLevel,
        data: Option<Value>,
    ) -> Option<RealtimeMessage> {
        let payload = SystemPayload::new(message, level, data);
        self.send(SYSTEM_MESSAGE, serde_json::to_value(payload).unwrap_or_default())
    }

    /// Call `callback` for every inbound frame of exactly `message_type`.
    ///
    /// Runs before the frame is republished on the bus. Dropping the
    /// returned handle removes the callback; so does [`disconnect`](Self::disconnect).
    pub fn subscribe<F>(&self, message_type: impl Into<String>, callback: F) -> RelaySubscription
    where
        F: Fn(&RealtimeMessage) + Send + Sync + 'static,
    {
        let message_type = message_type.into();
        let id = self.shared.next_handler_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .handlers
            .entry(message_type.clone())
            .or_default()
            .push((id, Arc::new(callback)));

        RelaySubscription {
            message_type,
            id,
            handlers: Arc::downgrade(&self.shared.handlers),
        }
    }

    /// Number of relay-local callbacks for `message_type`.
    pub fn subscriber_count(&self, message_type: &str) -> usize {
        self.shared
            .handlers
            .get(message_type)
            .map(|h| h.len())
            .unwrap_or(0)
    }

    /// Whether the socket is open.
    pub fn is_connected(&self) -> bool {
        self.status() == RelayStatus::Connected
    }

    /// Current lifecycle state.
    pub fn status(&self) -> RelayStatus {
        *self.shared.status.borrow()
    }

    /// Receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<RelayStatus> {
        self.shared.status.subscribe()
    }

    /// WebSocket-style ready state.
    pub fn ready_state(&self) -> ReadyState {
        self.status().ready_state()
    }

    /// Current configuration.
    pub fn config(&self) -> RelayConfig {
        self.shared.config.read().clone()
    }

    /// Modify the configuration; used from the next connection attempt.
    pub fn update_config(&self, update: impl FnOnce(&mut RelayConfig)) {
        let mut config = self.shared.config.write();
        update(&mut config);
        info!(?config, "Relay configuration updated");
    }
}

impl Shared {
    fn set_status(&self, status: RelayStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            debug!(%previous, %status, "Relay status changed");
        }
    }

    fn route(&self, text: &str) {
        let message: RealtimeMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Dropping unparseable frame");
                return;
            }
        };
        debug!(message_type = %message.message_type, id = %message.id, "Frame received");

        let callbacks: Vec<LocalCallback> = self
            .handlers
            .get(&message.message_type)
            .map(|h| h.iter().map(|(_, callback)| callback.clone()).collect())
            .unwrap_or_default();
        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(&message))).is_err() {
                error!(message_type = %message.message_type, "Relay subscriber panicked");
            }
        }

        if message.is_loan() {
            self.bus
                .publish(NewEvent::new(message.message_type, message.payload));
        } else if message.is_system() {
            match serde_json::from_value::<SystemPayload>(message.payload) {
                Ok(payload) => {
                    self.bus
                        .publish_system(payload.message, payload.level, payload.data);
                }
                Err(e) => {
                    warn!(message_type = %message.message_type, error = %e, "Dropping system frame with malformed payload");
                }
            }
        }
    }

    fn publish_connection_error(&self, error: &RealtimeError, url: &str) {
        self.bus.publish_system(
            "WebSocket connection error",
            EventLevel::Error,
            Some(json!({ "error": error.to_string(), "url": url })),
        );
    }
}

async fn open(config: &RelayConfig) -> RealtimeResult<WsStream> {
    let url = Url::parse(&config.url).map_err(|e| RealtimeError::InvalidUrl(e.to_string()))?;

    let (stream, _response) = tokio::time::timeout(config.connect_timeout, connect_async(url.as_str()))
        .await
        .map_err(|_| RealtimeError::Timeout(config.connect_timeout))??;
    Ok(stream)
}

async fn supervise(shared: Arc<Shared>, first: oneshot::Sender<RealtimeResult<()>>) {
    let mut first = Some(first);
    let mut attempts: u32 = 0;

    loop {
        let config = shared.config.read().clone();
        shared.set_status(RelayStatus::Connecting);

        match open(&config).await {
            Ok(stream) => {
                attempts = 0;
                let (tx, mut rx) = mpsc::unbounded_channel();
                *shared.outgoing.lock() = Some(tx);
                shared.set_status(RelayStatus::Connected);
                info!(url = %config.url, "Realtime relay connected");

                if let Some(first) = first.take() {
                    let _ = first.send(Ok(()));
                }

                let end = run_connection(&shared, stream, &mut rx).await;
                shared.outgoing.lock().take();

                if let ConnectionEnd::Requested = end {
                    return;
                }
                shared.set_status(RelayStatus::Disconnected);
            }
            Err(e) => {
                error!(url = %config.url, error = %e, "Realtime connection failed");
                shared.publish_connection_error(&e, &config.url);
                if let Some(first) = first.take() {
                    let _ = first.send(Err(e));
                }
            }
        }

        if shared.stopping.load(Ordering::SeqCst) {
            return;
        }

        if attempts >= config.max_reconnect_attempts {
            error!(attempts, "Maximum reconnect attempts reached");
            shared.bus.publish_system(
                "WebSocket unavailable: maximum reconnect attempts reached",
                EventLevel::Error,
                Some(json!({ "attempts": attempts })),
            );
            shared.set_status(RelayStatus::Exhausted);
            return;
        }

        attempts += 1;
        info!(
            attempt = attempts,
            max = config.max_reconnect_attempts,
            "Reconnecting in {:?}",
            config.reconnect_interval
        );
        shared.set_status(RelayStatus::Reconnecting { attempt: attempts });
        tokio::time::sleep(config.reconnect_interval).await;
    }
}

async fn run_connection(
    shared: &Shared,
    stream: WsStream,
    outgoing: &mut mpsc::UnboundedReceiver<Outbound>,
) -> ConnectionEnd {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            outbound = outgoing.recv() => match outbound {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        warn!(error = %e, "Failed to send frame");
                        return ConnectionEnd::Lost;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    let _ = write.close().await;
                    return ConnectionEnd::Requested;
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => shared.route(text.as_str()),
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "Server closed the connection");
                    return ConnectionEnd::Lost;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Connection error");
                    return ConnectionEnd::Lost;
                }
                None => return ConnectionEnd::Lost,
            },
        }
    }
}

/// Handle for a relay-local callback; dropping it removes the callback.
#[must_use = "dropping a RelaySubscription unsubscribes it"]
pub struct RelaySubscription {
    message_type: String,
    id: u64,
    handlers: Weak<LocalHandlers>,
}

impl RelaySubscription {
    /// Message type this subscription listens to.
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Remove the callback.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for RelaySubscription {
    fn drop(&mut self) {
        let Some(handlers) = self.handlers.upgrade() else {
            return;
        };
        if let Some(mut entries) = handlers.get_mut(&self.message_type) {
            entries.retain(|(id, _)| *id != self.id);
        }
        handlers.remove_if(&self.message_type, |_, entries| entries.is_empty());
    }
}
