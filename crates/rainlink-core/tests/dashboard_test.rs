#![allow(clippy::unwrap_used)]
// End-to-end tests for `Dashboard` against a local WebSocket server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use rainlink_api::SensorData;
use rainlink_core::{
    CoreError, Dashboard, DashboardConfig, Delivery, LinkState, Notification, ReconnectConfig,
    Severity, Zone, ZoneId,
};

const WAIT: Duration = Duration::from_secs(5);

// ── Fake controller board ───────────────────────────────────────────

/// Accepts one connection, forwards every text frame it receives to the
/// returned channel and writes every frame pushed into the returned sender.
async fn fake_board() -> (Url, mpsc::UnboundedReceiver<String>, mpsc::UnboundedSender<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("ws://{}/", listener.local_addr().unwrap())).unwrap();
    let (received_tx, received_rx) = mpsc::unbounded_channel();
    let (push_tx, mut push_rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let (mut write, mut read) = ws.split();
        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        let _ = received_tx.send(text.as_str().to_owned());
                    }
                    Some(Ok(_)) => {}
                    _ => break,
                },
                Some(out) = push_rx.recv() => {
                    if write.send(Message::text(out)).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    (url, received_rx, push_tx)
}

/// Accepts one connection, completes the handshake and closes it.
async fn closing_board() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("ws://{}/", listener.local_addr().unwrap())).unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = ws.close(None).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    url
}

async fn dead_endpoint() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("ws://{}/", listener.local_addr().unwrap())).unwrap();
    drop(listener);
    url
}

/// Wait for the first notification with `title`.
async fn next_titled(
    notifications: &mut broadcast::Receiver<Notification>,
    title: &str,
) -> Notification {
    tokio::time::timeout(WAIT, async {
        loop {
            let note = notifications.recv().await.unwrap();
            if note.title == title {
                return note;
            }
        }
    })
    .await
    .unwrap()
}

fn config(endpoint: Url, zones: Vec<Zone>) -> DashboardConfig {
    DashboardConfig::new(endpoint)
        .with_zones(zones)
        .with_reconnect(ReconnectConfig {
            initial_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
            max_retries: None,
        })
}

fn offline_config(zones: Vec<Zone>) -> DashboardConfig {
    config(Url::parse("ws://127.0.0.1:9/").unwrap(), zones)
}

// ── Toggle ──────────────────────────────────────────────────────────

#[tokio::test]
async fn toggle_sends_command_and_updates_store() {
    let (url, mut received, _push) = fake_board().await;
    let dashboard = Dashboard::new(config(url, vec![Zone::new(1, "Front lawn")])).unwrap();

    dashboard.connect().await.unwrap();
    dashboard.wait_connected(WAIT).await.unwrap();

    let outcome = dashboard.toggle_zone(ZoneId::new(1)).unwrap();
    assert!(outcome.active);
    assert!(matches!(outcome.delivery, Delivery::Sent));

    let frame = tokio::time::timeout(WAIT, received.recv()).await.unwrap().unwrap();
    assert_eq!(frame, r#"{"type":"toggle_zone","zoneId":1,"active":true}"#);
    assert!(dashboard.zone(ZoneId::new(1)).unwrap().active);

    dashboard.disconnect().await;
    assert_eq!(dashboard.link_state(), LinkState::Disconnected);
}

#[tokio::test]
async fn toggle_while_disconnected_still_flips_store() {
    let dashboard = Dashboard::new(offline_config(vec![Zone::new(1, "Front lawn")])).unwrap();

    let outcome = dashboard.toggle_zone(ZoneId::new(1)).unwrap();
    assert!(outcome.active);
    assert!(matches!(
        outcome.delivery,
        Delivery::NotSent(CoreError::NotConnected)
    ));
    assert!(dashboard.zone(ZoneId::new(1)).unwrap().active);
}

#[tokio::test]
async fn toggle_unknown_zone_fails_without_side_effects() {
    let dashboard = Dashboard::new(offline_config(vec![Zone::new(1, "Front lawn")])).unwrap();
    let before = dashboard.zones_snapshot();

    assert!(matches!(
        dashboard.toggle_zone(ZoneId::new(7)),
        Err(CoreError::ZoneNotFound { .. })
    ));
    assert_eq!(*dashboard.zones_snapshot(), *before);
}

// ── Rename ──────────────────────────────────────────────────────────

#[tokio::test]
async fn rename_emits_notification() {
    let dashboard = Dashboard::new(offline_config(vec![Zone::new(2, "Flower bed")])).unwrap();
    let mut notifications = dashboard.notifications();

    dashboard.rename_zone(ZoneId::new(2), "  Tulips ").unwrap();

    assert_eq!(dashboard.zone(ZoneId::new(2)).unwrap().name, "Tulips");
    let note = notifications.try_recv().unwrap();
    assert_eq!(note.severity, Severity::Success);
    assert_eq!(note.title, "Zone renamed");
    assert_eq!(note.description.as_deref(), Some("New name: Tulips"));
}

#[tokio::test]
async fn blank_rename_is_rejected_quietly() {
    let dashboard = Dashboard::new(offline_config(vec![Zone::new(2, "Flower bed")])).unwrap();
    let mut notifications = dashboard.notifications();
    let mut stream = dashboard.subscribe_zones();

    assert!(matches!(
        dashboard.rename_zone(ZoneId::new(2), "   "),
        Err(CoreError::InvalidName)
    ));
    assert_eq!(dashboard.zone(ZoneId::new(2)).unwrap().name, "Flower bed");
    assert!(notifications.try_recv().is_err());
    // No snapshot was published.
    assert!(
        tokio::time::timeout(Duration::from_millis(50), stream.changed())
            .await
            .is_err()
    );
}

// ── Sensor data ─────────────────────────────────────────────────────

#[tokio::test]
async fn sensor_frames_reach_the_store_in_order() {
    let (url, _received, push) = fake_board().await;
    let zones = vec![Zone::new(1, "Front lawn"), Zone::new(2, "Flower bed")];
    let dashboard = Dashboard::new(config(url, zones)).unwrap();
    let mut stream = dashboard.subscribe_zones();

    dashboard.connect().await.unwrap();
    dashboard.wait_connected(WAIT).await.unwrap();

    for moisture in [10, 20, 30] {
        push.send(format!(
            r#"{{"type":"sensor_data","data":{{"zoneId":1,"moisture":{moisture}}}}}"#
        ))
        .unwrap();
    }
    push.send(r#"{"type":"sensor_data","data":{"zoneId":99,"moisture":5}}"#.into())
        .unwrap();
    push.send(r#"{"type":"sensor_data","data":{"zoneId":2,"temperature":-2,"active":true}}"#.into())
        .unwrap();

    tokio::time::timeout(WAIT, async {
        loop {
            let snap = stream.changed().await.unwrap();
            if snap.get(ZoneId::new(2)).is_some_and(|z| z.active) {
                break;
            }
        }
    })
    .await
    .unwrap();

    let zone1 = dashboard.zone(ZoneId::new(1)).unwrap();
    assert_eq!(zone1.moisture, 30);
    assert!(!zone1.active);
    let zone2 = dashboard.zone(ZoneId::new(2)).unwrap();
    assert_eq!(zone2.temperature, -2);
    assert_eq!(zone2.moisture, 0);
    assert_eq!(dashboard.zones_snapshot().len(), 2);
    assert!(dashboard.last_sensor_update().is_some());

    dashboard.disconnect().await;
}

#[tokio::test]
async fn connect_emits_connected_notification() {
    let (url, _received, _push) = fake_board().await;
    let dashboard = Dashboard::new(config(url, vec![Zone::new(1, "Front lawn")])).unwrap();
    let mut notifications = dashboard.notifications();

    dashboard.connect().await.unwrap();

    let note = tokio::time::timeout(WAIT, notifications.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(note.title, "Connected to controller");
    assert_eq!(note.description.as_deref(), Some("Live data is streaming"));

    dashboard.disconnect().await;
}

#[tokio::test]
async fn dropping_the_dashboard_closes_the_link() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("ws://{}/", listener.local_addr().unwrap())).unwrap();
    let (closed_tx, closed_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(frame)) = ws.next().await {
            if frame.is_close() {
                break;
            }
        }
        let _ = closed_tx.send(());
    });

    let dashboard = Dashboard::new(config(url, vec![Zone::new(1, "Front lawn")])).unwrap();
    let mut state = dashboard.connection_state();
    dashboard.connect().await.unwrap();
    dashboard.wait_connected(WAIT).await.unwrap();

    drop(dashboard);

    tokio::time::timeout(WAIT, closed_rx).await.unwrap().unwrap();
    tokio::time::timeout(WAIT, state.wait_for(|s| *s == LinkState::Disconnected))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn dropped_connection_emits_connection_lost() {
    let url = closing_board().await;
    let dashboard = Dashboard::new(config(url, vec![Zone::new(1, "Front lawn")])).unwrap();
    let mut notifications = dashboard.notifications();

    dashboard.connect().await.unwrap();

    let connected = next_titled(&mut notifications, "Connected to controller").await;
    assert_eq!(connected.severity, Severity::Success);

    let lost = next_titled(&mut notifications, "Connection lost").await;
    assert_eq!(lost.severity, Severity::Error);
    assert_eq!(lost.description.as_deref(), Some("Attempting to reconnect..."));

    dashboard.disconnect().await;
}

#[tokio::test]
async fn exhausted_retries_emit_controller_unreachable() {
    let zones = vec![Zone::new(1, "Front lawn")];
    let dashboard = Dashboard::new(
        DashboardConfig::new(dead_endpoint().await)
            .with_zones(zones)
            .with_reconnect(ReconnectConfig {
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(10),
                max_retries: Some(0),
            }),
    )
    .unwrap();
    let mut notifications = dashboard.notifications();

    dashboard.connect().await.unwrap();

    let note = next_titled(&mut notifications, "Controller unreachable").await;
    assert_eq!(note.severity, Severity::Error);
    assert_eq!(
        note.description.as_deref(),
        Some("Stopped reconnecting after 0 attempts")
    );
    assert_eq!(dashboard.link_state(), LinkState::Disconnected);

    dashboard.disconnect().await;
}

#[tokio::test]
async fn out_of_range_sensor_data_is_ignored() {
    let dashboard = Dashboard::new(offline_config(vec![Zone::new(1, "Front lawn")])).unwrap();

    let flooded = SensorData {
        zone_id: 1,
        moisture: Some(200),
        temperature: Some(18),
        active: None,
    };
    assert!(!dashboard.apply_sensor_data(&flooded));

    let zone = dashboard.zone(ZoneId::new(1)).unwrap();
    assert_eq!(zone.moisture, 0);
    assert_eq!(zone.temperature, 0);
    assert_eq!(dashboard.summary().mean_moisture, 0);
    assert!(dashboard.last_sensor_update().is_none());
}

#[tokio::test]
async fn out_of_range_seed_moisture_is_rejected() {
    let seed = vec![Zone {
        moisture: 150,
        ..Zone::new(1, "Bog")
    }];
    assert!(matches!(
        Dashboard::new(offline_config(seed)),
        Err(CoreError::InvalidMoisture { moisture: 150, .. })
    ));
}

#[tokio::test]
async fn reconnect_after_disconnect_reuses_the_feed() {
    let dashboard = Dashboard::new(offline_config(vec![Zone::new(1, "Front lawn")])).unwrap();

    dashboard.connect().await.unwrap();
    dashboard.disconnect().await;
    dashboard.connect().await.unwrap();
    dashboard.disconnect().await;

    assert_eq!(dashboard.link_state(), LinkState::Disconnected);
}

#[tokio::test]
async fn duplicate_seed_is_rejected() {
    let result = Dashboard::new(offline_config(vec![Zone::new(1, "A"), Zone::new(1, "B")]));
    assert!(matches!(result, Err(CoreError::DuplicateZone { .. })));
}

#[tokio::test]
async fn oneshot_times_out_against_a_dead_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("ws://{}/", listener.local_addr().unwrap())).unwrap();
    drop(listener);

    let result = Dashboard::oneshot(
        config(url, vec![Zone::new(1, "Front lawn")]),
        Duration::from_millis(200),
        |d| async move { d.toggle_zone(ZoneId::new(1)) },
    )
    .await;

    assert!(matches!(result, Err(CoreError::ConnectionFailed { .. })));
}
