//! Device link: one reconnecting WebSocket to the irrigation controller.
//!
//! A [`DeviceLink`] owns at most one connection task. The task walks the
//! `Disconnected → Connecting → Connected` state machine, decodes inbound
//! frames, forwards sensor payloads through the [`SensorFeed`] in arrival
//! order, and writes queued [`OutboundCommand`]s. Failures are retried with
//! exponential backoff until [`DeviceLink::disconnect`] is called.
//!
//! # Example
//!
//! ```rust,ignore
//! use rainlink_api::{DeviceLink, ReconnectConfig, parse_endpoint};
//!
//! let endpoint = parse_endpoint("192.168.1.100:81")?;
//! let (link, mut feed) = DeviceLink::new(endpoint, ReconnectConfig::default());
//! link.connect();
//!
//! while let Some(reading) = feed.recv().await {
//!     println!("zone {} moisture {:?}", reading.zone_id, reading.moisture);
//! }
//!
//! link.disconnect().await;
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::protocol::{InboundMessage, OutboundCommand, SensorData};

// ── Channel capacities ───────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 256;
const SENSOR_CHANNEL_CAPACITY: usize = 256;
const OUTBOUND_QUEUE_CAPACITY: usize = 32;

// ── LinkState ────────────────────────────────────────────────────────

/// Connection state of the device link. Owned by the link, read-only
/// everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

// ── LinkEvent ────────────────────────────────────────────────────────

/// Lifecycle notifications broadcast by the link task, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link moved to a new state.
    StateChanged(LinkState),
    /// An established connection dropped unexpectedly.
    ConnectionLost { reason: String },
    /// A reconnect is pending. `attempt` counts from 1 and resets after
    /// every successful handshake.
    RetryScheduled { attempt: u32, delay: Duration },
    /// `max_retries` was exhausted; the task has stopped.
    GaveUp { attempts: u32 },
    /// An inbound frame could not be decoded and was dropped.
    FrameRejected { reason: String },
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum consecutive reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── SensorFeed ───────────────────────────────────────────────────────

/// Ordered stream of sensor payloads decoded by the link.
///
/// Payloads arrive in the order their frames were received. The feed stays
/// open for the lifetime of the [`DeviceLink`], across reconnects.
#[derive(Debug)]
pub struct SensorFeed {
    rx: mpsc::Receiver<SensorData>,
}

impl SensorFeed {
    /// Wait for the next payload. Returns `None` once every link handle
    /// is gone.
    pub async fn recv(&mut self) -> Option<SensorData> {
        self.rx.recv().await
    }

    /// Take a payload that has already arrived, without waiting.
    pub fn try_recv(&mut self) -> Option<SensorData> {
        self.rx.try_recv().ok()
    }
}

// ── DeviceLink ───────────────────────────────────────────────────────

/// Handle to the link. Cheaply cloneable; all clones drive the same
/// connection.
#[derive(Clone)]
pub struct DeviceLink {
    shared: Arc<Shared>,
    session: Arc<Mutex<Option<Session>>>,
}

/// State shared with the background task.
struct Shared {
    endpoint: Url,
    reconnect: ReconnectConfig,
    state: watch::Sender<LinkState>,
    events: broadcast::Sender<LinkEvent>,
    sensor_tx: mpsc::Sender<SensorData>,
}

/// A running connection task.
struct Session {
    cancel: CancellationToken,
    outbound: mpsc::Sender<String>,
    handle: JoinHandle<()>,
}

impl DeviceLink {
    /// Create a link for `endpoint`. Does NOT connect -- call
    /// [`connect()`](Self::connect) to start the background task.
    pub fn new(endpoint: Url, reconnect: ReconnectConfig) -> (Self, SensorFeed) {
        let (state, _) = watch::channel(LinkState::Disconnected);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (sensor_tx, sensor_rx) = mpsc::channel(SENSOR_CHANNEL_CAPACITY);

        let link = Self {
            shared: Arc::new(Shared {
                endpoint,
                reconnect,
                state,
                events,
                sensor_tx,
            }),
            session: Arc::new(Mutex::new(None)),
        };

        (link, SensorFeed { rx: sensor_rx })
    }

    /// The endpoint this link connects to.
    pub fn endpoint(&self) -> &Url {
        &self.shared.endpoint
    }

    /// The reconnection policy in effect.
    pub fn reconnect_config(&self) -> &ReconnectConfig {
        &self.shared.reconnect
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the connection task.
    ///
    /// Returns immediately; the first attempt happens asynchronously. A
    /// no-op while a task is already running, so concurrent callers never
    /// open a second connection. Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        let mut session = self.lock_session();

        if session.as_ref().is_some_and(|s| !s.handle.is_finished()) {
            tracing::debug!("device link already running");
            return;
        }

        let cancel = CancellationToken::new();
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let handle = tokio::spawn(link_loop(
            Arc::clone(&self.shared),
            cancel.clone(),
            outbound_rx,
        ));

        *session = Some(Session {
            cancel,
            outbound,
            handle,
        });
    }

    /// Close the connection and stop retrying.
    ///
    /// Cancels any pending reconnect timer and waits for the task to exit.
    /// When connected, commands already queued are written before the
    /// close frame. The link stays
    /// `Disconnected` until [`connect()`](Self::connect) is called again.
    pub async fn disconnect(&self) {
        let session = self.lock_session().take();
        let Some(session) = session else {
            return;
        };

        session.cancel.cancel();
        if let Err(e) = session.handle.await {
            tracing::warn!(error = %e, "device link task did not exit cleanly");
        }
        tracing::debug!("device link stopped");
    }

    /// Stop the connection task without waiting for it to exit.
    ///
    /// Usable from synchronous code such as `Drop`. The task still writes
    /// its close frame on the way out.
    pub fn shutdown(&self) {
        if let Some(session) = self.lock_session().take() {
            session.cancel.cancel();
            tracing::debug!("device link shutting down");
        }
    }

    /// Whether a connection task is alive (connected or retrying).
    pub fn is_running(&self) -> bool {
        self.lock_session()
            .as_ref()
            .is_some_and(|s| !s.handle.is_finished())
    }

    // ── Outbound ─────────────────────────────────────────────────────

    /// Queue a command for transmission.
    ///
    /// Only succeeds while `Connected`; otherwise returns
    /// [`Error::NotConnected`]. Never waits: a full queue is reported as
    /// [`Error::SendQueueFull`].
    pub fn send(&self, command: &OutboundCommand) -> Result<(), Error> {
        if self.state() != LinkState::Connected {
            return Err(Error::NotConnected);
        }

        let frame = command.to_frame()?;
        let session = self.lock_session();
        let session = session.as_ref().ok_or(Error::NotConnected)?;

        session.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => Error::SendQueueFull,
            TrySendError::Closed(_) => Error::NotConnected,
        })?;

        tracing::debug!(command = command.kind(), "queued outbound command");
        Ok(())
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Current connection state.
    pub fn state(&self) -> LinkState {
        *self.shared.state.borrow()
    }

    /// Subscribe to connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<LinkState> {
        self.shared.state.subscribe()
    }

    /// Subscribe to lifecycle events. Subscribe before calling
    /// [`connect()`](Self::connect) to observe every transition.
    pub fn events(&self) -> broadcast::Receiver<LinkEvent> {
        self.shared.events.subscribe()
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Shared {
    /// Move to `next`, broadcasting a [`LinkEvent::StateChanged`] only when
    /// the state actually changes.
    fn set_state(&self, next: LinkState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });

        if changed {
            tracing::debug!(state = %next, "device link state changed");
            self.emit(LinkEvent::StateChanged(next));
        }
    }

    fn emit(&self, event: LinkEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Decode a text frame, returning the sensor payload if it carries one.
    fn route_frame(&self, text: &str) -> Option<SensorData> {
        match InboundMessage::parse(text) {
            Ok(InboundMessage::SensorData(data)) => Some(data),
            Ok(InboundMessage::Other { kind }) => {
                tracing::trace!(kind, "ignoring unhandled message type");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed frame");
                self.emit(LinkEvent::FrameRejected {
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// How a single connection ended.
enum SessionEnd {
    /// `disconnect()` was called.
    Cancelled,
    /// The connection was established and then dropped.
    Lost(String),
}

/// Main loop: connect → read/write → on failure, backoff → reconnect.
async fn link_loop(
    shared: Arc<Shared>,
    cancel: CancellationToken,
    mut outbound: mpsc::Receiver<String>,
) {
    let mut attempt: u32 = 0;

    loop {
        shared.set_state(LinkState::Connecting);

        match connect_and_run(&shared, &cancel, &mut outbound).await {
            Ok(SessionEnd::Cancelled) => break,
            Ok(SessionEnd::Lost(reason)) => {
                shared.set_state(LinkState::Disconnected);
                tracing::warn!(%reason, "connection to controller lost");
                shared.emit(LinkEvent::ConnectionLost { reason });
                attempt = 0;
            }
            Err(e) => {
                shared.set_state(LinkState::Disconnected);
                tracing::warn!(error = %e, attempt, "connection attempt failed");
            }
        }

        if let Some(max) = shared.reconnect.max_retries {
            if attempt >= max {
                tracing::error!(
                    max_retries = max,
                    "reconnection limit reached, giving up"
                );
                shared.emit(LinkEvent::GaveUp { attempts: attempt });
                break;
            }
        }

        let delay = calculate_backoff(attempt, &shared.reconnect);
        attempt += 1;
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "waiting before reconnect"
        );
        shared.emit(LinkEvent::RetryScheduled { attempt, delay });

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    shared.set_state(LinkState::Disconnected);
    tracing::debug!("device link loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one connection and pump frames until it drops or is cancelled.
///
/// `Err` means the handshake itself failed and the link never reached
/// `Connected`.
async fn connect_and_run(
    shared: &Shared,
    cancel: &CancellationToken,
    outbound: &mut mpsc::Receiver<String>,
) -> Result<SessionEnd, Error> {
    tracing::info!(endpoint = %shared.endpoint, "connecting to controller");

    let handshake = tokio_tungstenite::connect_async(shared.endpoint.as_str());
    let (ws_stream, _response) = tokio::select! {
        biased;
        () = cancel.cancelled() => return Ok(SessionEnd::Cancelled),
        result = handshake => result.map_err(|e| Error::Connect(e.to_string()))?,
    };

    // Commands queued against a previous connection are stale.
    let mut stale = 0_usize;
    while outbound.try_recv().is_ok() {
        stale += 1;
    }
    if stale > 0 {
        tracing::debug!(stale, "discarded commands queued before reconnect");
    }

    shared.set_state(LinkState::Connected);
    tracing::info!("controller link established");

    let (mut write, mut read) = ws_stream.split();

    let end = loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break SessionEnd::Cancelled,
            Some(frame) = outbound.recv() => {
                if let Err(e) = write.send(Message::text(frame)).await {
                    break SessionEnd::Lost(e.to_string());
                }
            }
            frame = read.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => Some(text.as_str().to_owned()),
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => Some(text.to_owned()),
                        Err(_) => {
                            tracing::debug!(len = bytes.len(), "ignoring non-UTF-8 binary frame");
                            None
                        }
                    },
                    Some(Ok(Message::Ping(_))) => {
                        // tungstenite queues the pong reply itself
                        tracing::trace!("controller ping");
                        None
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame.map_or_else(
                            || "closed by controller".to_owned(),
                            |cf| {
                                format!(
                                    "closed by controller (code {}): {}",
                                    u16::from(cf.code),
                                    cf.reason.as_str()
                                )
                            },
                        );
                        break SessionEnd::Lost(reason);
                    }
                    Some(Ok(_)) => None,
                    Some(Err(e)) => break SessionEnd::Lost(e.to_string()),
                    None => break SessionEnd::Lost("stream ended".to_owned()),
                };

                let Some(data) = text.as_deref().and_then(|t| shared.route_frame(t)) else {
                    continue;
                };

                // Backpressure from a slow consumer must not block shutdown.
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break SessionEnd::Cancelled,
                    result = shared.sensor_tx.send(data) => {
                        if result.is_err() {
                            tracing::trace!("sensor feed dropped, discarding reading");
                        }
                    }
                }
            }
        }
    };

    if matches!(end, SessionEnd::Cancelled) {
        // Commands accepted by `send()` still go out before the close frame.
        while let Ok(frame) = outbound.try_recv() {
            if let Err(e) = write.send(Message::text(frame)).await {
                tracing::debug!(error = %e, "failed to flush queued command");
                break;
            }
        }
        if let Err(e) = write.send(Message::Close(None)).await {
            tracing::debug!(error = %e, "failed to send close frame");
        }
    }

    Ok(end)
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 +- 0.25)`
#[allow(clippy::cast_precision_loss)]
pub fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
