//! SocketService
//!
//! 1 本のリアルタイム接続を管理するサービスです。
//!
//! - 接続状態マシン：状態が変化したときだけ `subscribe_state()` のストリームへ通知
//! - 再接続コントローラー：予期しない切断のあと `ReconnectPolicy` に従ってタイマーで再接続
//! - イベント配信：受信した `new_message` と名前付きイベントを `EventDispatcher` へ渡す
//!
//! セッションの状態はすべて 1 つの Mutex の内側にあり、接続ごとのドライバータスクと
//! 再接続タイマータスクは世代番号で古いものを見分けます。

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex as StdMutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use serde::Serialize;
use serde_json::{Value, json};
use terakoya_shared::protocol::{Envelope, event};
use tokio::{
    sync::{Mutex, broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::{sleep, timeout},
};

use super::{
    config::SocketConfig,
    dispatcher::{EventDispatcher, Handler},
    reconnect::ReconnectDecision,
    state::ConnectionState,
    transport::{Connector, TransportEvent, TransportLink, WebSocketConnector},
};
use crate::error::{SocketError, TransportError};

const STATE_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle names only ever raised locally; frames using them are ignored.
const LOCAL_EVENTS: [&str; 8] = [
    event::CONNECT,
    event::DISCONNECT,
    event::CONNECT_ERROR,
    event::ERROR,
    event::RECONNECT,
    event::RECONNECT_ATTEMPT,
    event::RECONNECT_ERROR,
    event::RECONNECT_FAILED,
];

#[derive(Default)]
struct Session {
    user_id: Option<String>,
    should_auto_reconnect: bool,
    reconnect_attempts: u32,
    state: ConnectionState,
    outbound: Option<mpsc::UnboundedSender<Envelope>>,
    driver: Option<JoinHandle<()>>,
    reconnect_timer: Option<JoinHandle<()>>,
    generation: u64,
}

impl Session {
    fn cancel_reconnect_timer(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            timer.abort();
        }
    }

    /// Drop the link and stop its driver
    fn stop_driver(&mut self) {
        self.outbound = None;
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }

    fn shut_down(&mut self) {
        self.should_auto_reconnect = false;
        self.cancel_reconnect_timer();
        self.stop_driver();
        self.generation += 1;
    }
}

/// Why an established link ended
enum LinkLost {
    Closed(String),
    Failed(TransportError),
}

struct Inner {
    config: SocketConfig,
    connector: Arc<dyn Connector>,
    session: Mutex<Session>,
    state_tx: broadcast::Sender<ConnectionState>,
    dispatcher: EventDispatcher,
    pending_acks: StdMutex<HashMap<u64, oneshot::Sender<Value>>>,
    next_ack_id: AtomicU64,
}

impl Inner {
    /// Update the state and publish it, only when it actually changes
    fn set_state(&self, session: &mut Session, state: ConnectionState) {
        if session.state == state {
            return;
        }
        let previous = std::mem::replace(&mut session.state, state);
        tracing::info!("Connection state: {} -> {}", previous, state);
        // No receiver is fine
        let _ = self.state_tx.send(state);
    }

    fn start_handshake(self: &Arc<Self>, session: &mut Session) {
        let Some(user_id) = session.user_id.clone() else {
            return;
        };
        session.stop_driver();
        session.generation += 1;
        self.set_state(session, ConnectionState::Connecting);
        session.driver = Some(tokio::spawn(drive(
            self.clone(),
            session.generation,
            user_id,
        )));
    }

    /// Reconnection controller, run after an unexpected closure
    fn schedule_reconnect(self: &Arc<Self>, session: &mut Session) -> ReconnectDecision {
        if !session.should_auto_reconnect || session.user_id.is_none() {
            return ReconnectDecision::Skip;
        }

        let policy = self.config.reconnect;
        let Some(attempt) = policy.next_attempt(session.reconnect_attempts) else {
            tracing::error!(
                "Failed to reconnect after {} attempts. Giving up.",
                session.reconnect_attempts
            );
            self.set_state(session, ConnectionState::Error);
            return ReconnectDecision::GiveUp;
        };

        session.cancel_reconnect_timer();
        session.reconnect_attempts = attempt;
        let delay = policy.delay_for(attempt);
        tracing::info!(
            "Reconnecting in {:?}... (attempt {}/{})",
            delay,
            attempt,
            policy.max_attempts
        );
        self.set_state(session, ConnectionState::Reconnecting);
        session.reconnect_timer = Some(tokio::spawn(reconnect_after(
            self.clone(),
            delay,
            attempt,
        )));
        ReconnectDecision::Scheduled
    }

    fn announce(&self, decision: ReconnectDecision) {
        if decision == ReconnectDecision::GiveUp {
            self.dispatcher.dispatch_event(
                event::RECONNECT_FAILED,
                &json!(self.config.reconnect.max_attempts),
            );
        }
    }

    fn send(&self, session: &Session, envelope: Envelope) -> Result<(), SocketError> {
        match (&session.state, &session.outbound) {
            (ConnectionState::Connected, Some(outbound)) => outbound
                .send(envelope)
                .map_err(|_| SocketError::NotConnected),
            _ => {
                tracing::warn!(
                    "Dropping '{}': not connected (state: {})",
                    envelope.event,
                    session.state
                );
                Err(SocketError::NotConnected)
            }
        }
    }

    fn pending_acks(&self) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<Value>>> {
        self.pending_acks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Dropping the senders resolves every waiter with `AckDropped`
    fn fail_pending_acks(&self) {
        self.pending_acks().clear();
    }

    fn handle_frame(&self, envelope: Envelope) {
        if envelope.is_ack() {
            let waiter = envelope.ack.and_then(|id| self.pending_acks().remove(&id));
            match waiter {
                Some(waiter) => {
                    let _ = waiter.send(envelope.data);
                }
                None => tracing::debug!("Ack {:?} has no waiter", envelope.ack),
            }
            return;
        }

        if LOCAL_EVENTS.contains(&envelope.event.as_str()) {
            tracing::debug!("Ignoring reserved event '{}' from server", envelope.event);
            return;
        }

        if envelope.event == event::NEW_MESSAGE {
            let outcomes = self.dispatcher.dispatch_new_message(&envelope.data);
            let failed = outcomes.iter().filter(|o| !o.is_delivered()).count();
            if failed > 0 {
                tracing::debug!(
                    "new_message delivered to {}/{} subscriber(s)",
                    outcomes.len() - failed,
                    outcomes.len()
                );
            }
        }
        self.dispatcher
            .dispatch_event(&envelope.event, &envelope.data);
    }

    async fn handshake_failed(self: &Arc<Self>, generation: u64, error: TransportError) {
        let mut session = self.session.lock().await;
        if session.generation != generation {
            return;
        }
        tracing::warn!("Connection error: {}", error);
        let reconnecting = session.reconnect_attempts > 0;
        self.set_state(&mut session, ConnectionState::Error);
        let decision = self.schedule_reconnect(&mut session);
        drop(session);

        let message = json!(error.to_string());
        self.dispatcher
            .dispatch_event(event::CONNECT_ERROR, &message);
        if reconnecting {
            self.dispatcher
                .dispatch_event(event::RECONNECT_ERROR, &message);
        }
        self.announce(decision);
    }

    async fn connection_lost(self: &Arc<Self>, generation: u64, lost: LinkLost) {
        let mut session = self.session.lock().await;
        if session.generation != generation {
            return;
        }
        session.outbound = None;
        self.fail_pending_acks();
        let (name, payload) = match lost {
            LinkLost::Closed(reason) => {
                tracing::info!("Connection closed: {}", reason);
                self.set_state(&mut session, ConnectionState::Disconnected);
                (event::DISCONNECT, json!(reason))
            }
            LinkLost::Failed(error) => {
                tracing::warn!("Connection error: {}", error);
                self.set_state(&mut session, ConnectionState::Error);
                (event::ERROR, json!(error.to_string()))
            }
        };
        let decision = self.schedule_reconnect(&mut session);
        drop(session);

        self.dispatcher.dispatch_event(name, &payload);
        self.announce(decision);
    }
}

/// One connection: handshake, then pump inbound frames until the link ends
async fn drive(inner: Arc<Inner>, generation: u64, user_id: String) {
    let connect_timeout = inner.config.connect_timeout;
    let handshake = timeout(
        connect_timeout,
        inner.connector.connect(&inner.config.url, &user_id),
    )
    .await
    .unwrap_or_else(|_| Err(TransportError::Timeout(connect_timeout)));

    let TransportLink {
        outbound,
        mut inbound,
    } = match handshake {
        Ok(link) => link,
        Err(e) => {
            inner.handshake_failed(generation, e).await;
            return;
        }
    };

    let reconnected_after = {
        let mut session = inner.session.lock().await;
        if session.generation != generation {
            return;
        }
        let attempts = std::mem::take(&mut session.reconnect_attempts);
        session.outbound = Some(outbound);
        inner.set_state(&mut session, ConnectionState::Connected);
        // Bind the channel to the user
        if let Err(e) = inner.send(&session, Envelope::new(event::REGISTER, json!(user_id))) {
            tracing::warn!("Failed to register '{}': {}", user_id, e);
        }
        attempts
    };

    tracing::info!("Connected as '{}'", user_id);
    inner
        .dispatcher
        .dispatch_event(event::CONNECT, &Value::Null);
    if reconnected_after > 0 {
        inner
            .dispatcher
            .dispatch_event(event::RECONNECT, &json!(reconnected_after));
    }

    let lost = loop {
        match inbound.recv().await {
            Some(TransportEvent::Frame(envelope)) => inner.handle_frame(envelope),
            Some(TransportEvent::Closed(reason)) => break LinkLost::Closed(reason),
            Some(TransportEvent::Error(e)) => break LinkLost::Failed(e),
            None => break LinkLost::Closed("transport dropped".to_string()),
        }
    };
    inner.connection_lost(generation, lost).await;
}

/// One-shot reconnect timer
async fn reconnect_after(inner: Arc<Inner>, delay: Duration, attempt: u32) {
    sleep(delay).await;
    {
        let mut session = inner.session.lock().await;
        session.reconnect_timer = None;
        if !session.should_auto_reconnect || session.user_id.is_none() {
            return;
        }
        tracing::info!("Reconnect attempt {}", attempt);
        inner.start_handshake(&mut session);
    }
    inner
        .dispatcher
        .dispatch_event(event::RECONNECT_ATTEMPT, &json!(attempt));
}

/// Stops the background tasks once the last `SocketService` handle is gone.
///
/// The driver and timer tasks keep `Inner` alive, so this cannot live on `Inner`.
struct Teardown {
    inner: Arc<Inner>,
}

impl Drop for Teardown {
    fn drop(&mut self) {
        match self.inner.session.try_lock() {
            Ok(mut session) => session.shut_down(),
            Err(_) => {
                if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                    let inner = self.inner.clone();
                    runtime.spawn(async move {
                        inner.session.lock().await.shut_down();
                    });
                }
            }
        }
        self.inner.fail_pending_acks();
        tracing::debug!("SocketService dropped, background tasks stopped");
    }
}

/// Realtime connection with automatic reconnection and event fan-out.
///
/// Cloning yields another handle to the same connection. Dropping the last
/// handle closes the link and cancels any pending reconnect.
#[derive(Clone)]
pub struct SocketService {
    inner: Arc<Inner>,
    _teardown: Arc<Teardown>,
}

impl SocketService {
    /// Create a service connecting over WebSocket
    pub fn new(config: SocketConfig) -> Self {
        Self::with_connector(config, Arc::new(WebSocketConnector))
    }

    pub fn with_connector(config: SocketConfig, connector: Arc<dyn Connector>) -> Self {
        let (state_tx, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        let inner = Arc::new(Inner {
            config,
            connector,
            session: Mutex::new(Session::default()),
            state_tx,
            dispatcher: EventDispatcher::new(),
            pending_acks: StdMutex::new(HashMap::new()),
            next_ack_id: AtomicU64::new(1),
        });
        Self {
            _teardown: Arc::new(Teardown {
                inner: inner.clone(),
            }),
            inner,
        }
    }

    /// Start a session for `user_id`. The handshake runs in the background.
    ///
    /// No-op while a connection is established.
    pub async fn connect(&self, user_id: impl Into<String>, auto_reconnect: bool) {
        let user_id = user_id.into();
        let mut session = self.inner.session.lock().await;
        if session.state.is_connected() {
            tracing::debug!(
                "Already connected as {:?}; ignoring connect for '{}'",
                session.user_id,
                user_id
            );
            return;
        }
        session.cancel_reconnect_timer();
        session.user_id = Some(user_id);
        session.reconnect_attempts = 0;
        session.should_auto_reconnect = auto_reconnect;
        self.inner.start_handshake(&mut session);
    }

    /// Close the connection.
    ///
    /// A pending reconnect timer is cancelled before this returns. A permanent
    /// disconnect also forgets the user and every subscriber.
    pub async fn disconnect(&self, permanent: bool) {
        let was_connected = {
            let mut session = self.inner.session.lock().await;
            session.cancel_reconnect_timer();
            session.should_auto_reconnect = !permanent;
            session.stop_driver();
            session.generation += 1;
            let was_connected = session.state.is_connected();
            self.inner
                .set_state(&mut session, ConnectionState::Disconnected);
            if permanent {
                session.user_id = None;
                session.reconnect_attempts = 0;
            }
            was_connected
        };
        self.inner.fail_pending_acks();

        if was_connected {
            self.inner
                .dispatcher
                .dispatch_event(event::DISCONNECT, &json!("client disconnect"));
        }
        if permanent {
            self.inner.dispatcher.clear();
        }
    }

    /// Drop the current link, wait for the grace period and handshake again
    /// with a fresh retry budget.
    ///
    /// Any `disconnect()` or `connect()` during the grace period cancels the
    /// pending handshake.
    pub async fn reconnect(&self) -> Result<(), SocketError> {
        if self.user_id().await.is_none() {
            return Err(SocketError::NoActiveSession);
        }
        self.disconnect(false).await;
        let generation = self.inner.session.lock().await.generation;
        sleep(self.inner.config.reconnect_grace).await;

        let mut session = self.inner.session.lock().await;
        if session.user_id.is_none() {
            return Err(SocketError::NoActiveSession);
        }
        // A disconnect or connect during the grace period wins
        if session.generation != generation {
            tracing::debug!("Manual reconnect superseded during grace period");
            return Ok(());
        }
        session.cancel_reconnect_timer();
        session.reconnect_attempts = 0;
        self.inner.start_handshake(&mut session);
        Ok(())
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.session.lock().await.state
    }

    /// Stream of state changes from now on. Earlier values are not replayed.
    pub fn subscribe_state(&self) -> broadcast::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    pub async fn reconnect_attempts(&self) -> u32 {
        self.inner.session.lock().await.reconnect_attempts
    }

    pub async fn user_id(&self) -> Option<String> {
        self.inner.session.lock().await.user_id.clone()
    }

    /// Register a `new_message` subscriber. Returns `false` if already registered.
    pub fn on_new_message(&self, handler: Handler) -> bool {
        self.inner.dispatcher.on_new_message(handler)
    }

    pub fn off_new_message(&self, handler: Option<&Handler>) {
        self.inner.dispatcher.off_new_message(handler)
    }

    pub fn on(&self, event: &str, handler: Handler) {
        self.inner.dispatcher.on(event, handler)
    }

    pub fn off(&self, event: &str, handler: Option<&Handler>) {
        self.inner.dispatcher.off(event, handler)
    }

    /// Send an event. Dropped with `NotConnected` unless connected.
    pub async fn emit<T>(&self, event: &str, payload: &T) -> Result<(), SocketError>
    where
        T: Serialize + ?Sized,
    {
        let data = to_data(payload)?;
        let session = self.inner.session.lock().await;
        self.inner.send(&session, Envelope::new(event, data))
    }

    /// Send an event and wait for the peer's acknowledgement payload
    pub async fn emit_with_ack<T>(&self, event: &str, payload: &T) -> Result<Value, SocketError>
    where
        T: Serialize + ?Sized,
    {
        let data = to_data(payload)?;
        let id = self.inner.next_ack_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.inner.pending_acks().insert(id, tx);

        let sent = {
            let session = self.inner.session.lock().await;
            self.inner
                .send(&session, Envelope::new(event, data).with_ack(id))
        };
        if let Err(e) = sent {
            self.inner.pending_acks().remove(&id);
            return Err(e);
        }

        let ack_timeout = self.inner.config.ack_timeout;
        match timeout(ack_timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(SocketError::AckDropped),
            Err(_) => {
                self.inner.pending_acks().remove(&id);
                Err(SocketError::AckTimeout(ack_timeout))
            }
        }
    }
}

fn to_data<T: Serialize + ?Sized>(payload: &T) -> Result<Value, SocketError> {
    serde_json::to_value(payload).map_err(|e| SocketError::Encode(e.to_string()))
}
