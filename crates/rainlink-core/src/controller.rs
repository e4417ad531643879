// ── Dashboard controller ──
//
// Session lifecycle for one irrigation controller board. Owns the zone
// store and the device link, applies live sensor data in arrival order,
// and turns link lifecycle events into user-facing notifications.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use rainlink_api::{DeviceLink, LinkEvent, LinkState, SensorData, SensorFeed};

use crate::config::DashboardConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::{Zone, ZoneId, ZoneSummary};
use crate::notification::Notification;
use crate::store::ZoneStore;
use crate::stream::ZoneStream;

const NOTIFICATION_CHANNEL_SIZE: usize = 64;

// ── Toggle outcome ───────────────────────────────────────────────

/// Whether a command made it onto the link's outbound queue.
#[derive(Debug)]
pub enum Delivery {
    Sent,
    NotSent(CoreError),
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Result of [`Dashboard::toggle_zone`].
///
/// The store is updated whether or not the command was delivered; a
/// front end can use `delivery` to warn that the board may disagree.
#[derive(Debug)]
pub struct ToggleOutcome {
    pub zone_id: ZoneId,
    /// The valve flag now held by the store.
    pub active: bool,
    pub delivery: Delivery,
}

// ── Dashboard ────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Created with a zone seed,
/// connected with [`connect()`](Self::connect), torn down with
/// [`disconnect()`](Self::disconnect). Dropping the last clone stops the
/// link and the background tasks.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    zones: watch::Sender<Arc<ZoneStore>>,
    link: DeviceLink,
    /// Parked here while no sensor task is running.
    feed: Mutex<Option<SensorFeed>>,
    notifications: broadcast::Sender<Notification>,
    last_sensor_update: watch::Sender<Option<DateTime<Utc>>>,
    tasks: Mutex<Option<Tasks>>,
}

struct Tasks {
    cancel: CancellationToken,
    sensor: JoinHandle<SensorFeed>,
    events: JoinHandle<()>,
}

impl Dashboard {
    /// Create a dashboard from configuration. Seeds the zone store but
    /// does NOT connect.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let store = ZoneStore::new(config.zones.clone())?;
        let (zones, _) = watch::channel(Arc::new(store));
        let (link, feed) = DeviceLink::new(config.endpoint.clone(), config.reconnect.clone());
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        let (last_sensor_update, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(DashboardInner {
                config,
                zones,
                link,
                feed: Mutex::new(Some(feed)),
                notifications,
                last_sensor_update,
                tasks: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Start the device link and the background tasks that consume it.
    ///
    /// Returns as soon as the tasks are running; the link connects (and
    /// reconnects) on its own. Calling this again while connected is a
    /// no-op, and after the link has given up it starts a fresh attempt.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let mut tasks = self.inner.tasks.lock().await;

        if tasks.is_none() {
            let feed = self
                .inner
                .feed
                .lock()
                .await
                .take()
                .ok_or_else(|| CoreError::Internal("sensor feed already in use".into()))?;

            let cancel = CancellationToken::new();
            // Subscribe before the link starts so the first transition is seen.
            let link_events = self.inner.link.events();

            let sensor = tokio::spawn(sensor_task(
                Arc::downgrade(&self.inner),
                feed,
                cancel.clone(),
            ));
            let events = tokio::spawn(link_event_task(
                Arc::downgrade(&self.inner),
                link_events,
                cancel.clone(),
            ));

            *tasks = Some(Tasks {
                cancel,
                sensor,
                events,
            });
        }

        self.inner.link.connect();
        info!(endpoint = %self.inner.config.endpoint, "dashboard connecting");
        Ok(())
    }

    /// Close the link and stop background tasks.
    ///
    /// Sensor frames already received are applied before this returns.
    /// Zone state is kept; `connect()` may be called again.
    pub async fn disconnect(&self) {
        self.inner.link.disconnect().await;

        let Some(tasks) = self.inner.tasks.lock().await.take() else {
            return;
        };
        tasks.cancel.cancel();

        match tasks.sensor.await {
            Ok(feed) => *self.inner.feed.lock().await = Some(feed),
            Err(e) => warn!(error = %e, "sensor task panicked"),
        }
        if let Err(e) = tasks.events.await {
            warn!(error = %e, "link event task panicked");
        }

        info!("dashboard disconnected");
    }

    /// Wait until the link reports `Connected`.
    pub async fn wait_connected(&self, timeout: Duration) -> Result<(), CoreError> {
        let mut rx = self.inner.link.subscribe_state();
        match tokio::time::timeout(timeout, rx.wait_for(|s| *s == LinkState::Connected)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(CoreError::Internal("link state channel closed".into())),
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// One-shot: connect, wait for the link, run closure, disconnect.
    ///
    /// Intended for CLI commands that send a single command.
    pub async fn oneshot<F, Fut, T>(
        config: DashboardConfig,
        timeout: Duration,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Dashboard) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let dashboard = Dashboard::new(config)?;
        dashboard.connect().await?;
        let result = match dashboard.wait_connected(timeout).await {
            Ok(()) => f(dashboard.clone()).await,
            Err(CoreError::Timeout { timeout_secs }) => Err(CoreError::ConnectionFailed {
                endpoint: dashboard.inner.config.endpoint.to_string(),
                reason: format!("no connection after {timeout_secs}s"),
            }),
            Err(e) => Err(e),
        };
        dashboard.disconnect().await;
        result
    }

    // ── Zone operations ──────────────────────────────────────────

    /// Ask the board to flip a zone's valve and flip it locally.
    ///
    /// The local flip happens regardless of whether the command could be
    /// sent; `ToggleOutcome::delivery` says which. Fails only for an
    /// unknown zone.
    pub fn toggle_zone(&self, id: ZoneId) -> Result<ToggleOutcome, CoreError> {
        let mut outcome = Err(CoreError::ZoneNotFound { id });

        self.inner.zones.send_if_modified(|store| {
            let Some(zone) = store.get(id) else {
                return false;
            };
            let target = !zone.active;

            let delivery = match self.inner.link.send(&convert::toggle_command(id, target)) {
                Ok(()) => Delivery::Sent,
                Err(e) => {
                    warn!(zone_id = %id, error = %e, "toggle command not sent");
                    Delivery::NotSent(e.into())
                }
            };

            let flipped = Arc::make_mut(store).set_active(id, target).is_ok();
            outcome = Ok(ToggleOutcome {
                zone_id: id,
                active: target,
                delivery,
            });
            flipped
        });

        if let Ok(ref o) = outcome {
            debug!(zone_id = %id, active = o.active, sent = o.delivery.is_sent(), "zone toggled");
        }
        outcome
    }

    /// Rename a zone locally. Never contacts the board.
    pub fn rename_zone(&self, id: ZoneId, name: &str) -> Result<(), CoreError> {
        let mut result = Ok(());

        self.inner.zones.send_if_modified(|store| {
            // Validate first so a rejected rename never copies the store.
            if name.trim().is_empty() {
                result = Err(CoreError::InvalidName);
                return false;
            }
            if !store.contains(id) {
                result = Err(CoreError::ZoneNotFound { id });
                return false;
            }
            result = Arc::make_mut(store).rename(id, name);
            result.is_ok()
        });

        result?;
        debug!(zone_id = %id, "zone renamed");
        self.notify(Notification::renamed(name.trim()));
        Ok(())
    }

    /// Apply one sensor payload to the store. Returns whether a zone
    /// matched and was updated; payloads for unknown zones or with
    /// moisture above 100 are ignored.
    pub fn apply_sensor_data(&self, data: &SensorData) -> bool {
        self.inner.apply_sensor_data(data)
    }

    // ── Queries ──────────────────────────────────────────────────

    pub fn summary(&self) -> ZoneSummary {
        self.inner.zones.borrow().summary()
    }

    pub fn zone(&self, id: ZoneId) -> Option<Zone> {
        self.inner.zones.borrow().get(id).cloned()
    }

    /// Immutable snapshot of every zone.
    pub fn zones_snapshot(&self) -> Arc<ZoneStore> {
        Arc::clone(&self.inner.zones.borrow())
    }

    /// Subscribe to zone changes.
    pub fn subscribe_zones(&self) -> ZoneStream {
        ZoneStream::new(self.inner.zones.subscribe())
    }

    /// When the last sensor payload was applied.
    pub fn last_sensor_update(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_sensor_update.borrow()
    }

    // ── State observation ────────────────────────────────────────

    pub fn link_state(&self) -> LinkState {
        self.inner.link.state()
    }

    pub fn is_connected(&self) -> bool {
        self.link_state() == LinkState::Connected
    }

    /// Subscribe to link state changes.
    pub fn connection_state(&self) -> watch::Receiver<LinkState> {
        self.inner.link.subscribe_state()
    }

    /// Subscribe to raw link lifecycle events.
    pub fn link_events(&self) -> broadcast::Receiver<LinkEvent> {
        self.inner.link.events()
    }

    /// Subscribe to user-facing notifications.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    fn notify(&self, notification: Notification) {
        self.inner.notify(notification);
    }
}

impl DashboardInner {
    fn notify(&self, notification: Notification) {
        let _ = self.notifications.send(notification);
    }

    fn apply_sensor_data(&self, data: &SensorData) -> bool {
        let (id, update) = convert::sensor_update(data);
        if !update.is_in_range() {
            warn!(zone_id = %id, moisture = ?update.moisture, "sensor data out of range ignored");
            return false;
        }
        let mut matched = false;

        self.zones.send_if_modified(|store| {
            if !store.contains(id) {
                return false;
            }
            matched = true;
            !update.is_empty() && Arc::make_mut(store).apply_sensor_update(id, &update)
        });

        if matched {
            self.last_sensor_update.send_replace(Some(Utc::now()));
        } else {
            debug!(zone_id = %id, "sensor data for unknown zone ignored");
        }
        matched
    }
}

impl Drop for DashboardInner {
    fn drop(&mut self) {
        if let Some(tasks) = self.tasks.get_mut().take() {
            tasks.cancel.cancel();
        }
        self.link.shutdown();
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Apply sensor payloads in arrival order. Hands the feed back on exit so
/// a later `connect()` can reuse it.
async fn sensor_task(
    inner: Weak<DashboardInner>,
    mut feed: SensorFeed,
    cancel: CancellationToken,
) -> SensorFeed {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                if let Some(inner) = inner.upgrade() {
                    while let Some(data) = feed.try_recv() {
                        inner.apply_sensor_data(&data);
                    }
                }
                break;
            }
            data = feed.recv() => {
                let Some(data) = data else { break };
                let Some(inner) = inner.upgrade() else { break };
                inner.apply_sensor_data(&data);
            }
        }
    }
    feed
}

/// Turn link lifecycle events into notifications.
async fn link_event_task(
    inner: Weak<DashboardInner>,
    mut events: broadcast::Receiver<LinkEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = events.recv() => event,
        };
        let Some(inner) = inner.upgrade() else { break };
        match event {
            Ok(LinkEvent::StateChanged(LinkState::Connected)) => {
                inner.notify(Notification::connected());
            }
            Ok(LinkEvent::ConnectionLost { reason }) => {
                debug!(%reason, "link lost");
                inner.notify(Notification::connection_lost());
            }
            Ok(LinkEvent::GaveUp { attempts }) => {
                inner.notify(Notification::gave_up(attempts));
            }
            Ok(LinkEvent::RetryScheduled { attempt, delay }) => {
                debug!(attempt, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "reconnect scheduled");
            }
            Ok(LinkEvent::FrameRejected { reason }) => {
                debug!(%reason, "controller sent a malformed frame");
            }
            Ok(LinkEvent::StateChanged(_)) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "link event receiver lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
