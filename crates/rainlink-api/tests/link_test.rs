#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceLink` against a local WebSocket server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use rainlink_api::{
    DeviceLink, Error, LinkEvent, LinkState, OutboundCommand, ReconnectConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

const WAIT: Duration = Duration::from_secs(5);

async fn bind() -> (TcpListener, Url) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = Url::parse(&format!("ws://{addr}/")).unwrap();
    (listener, url)
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .unwrap()
        .unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

/// An endpoint nothing is listening on.
async fn dead_endpoint() -> Url {
    let (listener, url) = bind().await;
    drop(listener);
    url
}

fn slow_retry() -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_secs(60),
        max_delay: Duration::from_secs(60),
        max_retries: None,
    }
}

fn fast_retry(max_retries: Option<u32>) -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(50),
        max_retries,
    }
}

async fn next_event(rx: &mut broadcast::Receiver<LinkEvent>) -> LinkEvent {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for link event")
        .unwrap()
}

async fn wait_for_state(link: &DeviceLink, target: LinkState) {
    let mut rx = link.subscribe_state();
    tokio::time::timeout(WAIT, rx.wait_for(|s| *s == target))
        .await
        .expect("timed out waiting for link state")
        .unwrap();
}

fn sensor_frame(zone_id: u32, moisture: u8) -> Message {
    Message::text(format!(
        r#"{{"type":"sensor_data","data":{{"zoneId":{zone_id},"moisture":{moisture}}}}}"#
    ))
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn server_close_walks_state_machine_and_schedules_one_retry() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        ws.close(None).await.unwrap();
        // Drain until the client acknowledges.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (link, _feed) = DeviceLink::new(url, slow_retry());
    let mut events = link.events();
    link.connect();

    let mut seen = Vec::new();
    loop {
        let event = next_event(&mut events).await;
        let done = matches!(event, LinkEvent::RetryScheduled { .. });
        seen.push(event);
        if done {
            break;
        }
    }

    let states: Vec<LinkState> = seen
        .iter()
        .filter_map(|e| match e {
            LinkEvent::StateChanged(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            LinkState::Connecting,
            LinkState::Connected,
            LinkState::Disconnected,
        ]
    );
    assert!(seen.iter().any(|e| matches!(e, LinkEvent::ConnectionLost { .. })));
    assert_eq!(
        seen.last().unwrap(),
        &LinkEvent::RetryScheduled {
            attempt: 1,
            delay: Duration::from_secs(60),
        }
    );
    assert_eq!(link.state(), LinkState::Disconnected);

    link.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn reconnects_after_connection_loss() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut first = accept(&listener).await;
        first.close(None).await.unwrap();
        drop(first);

        let mut second = accept(&listener).await;
        second.send(sensor_frame(3, 44)).await.unwrap();
        while let Some(Ok(_)) = second.next().await {}
    });

    let (link, mut feed) = DeviceLink::new(url, fast_retry(None));
    let mut events = link.events();
    link.connect();

    let mut connected = 0;
    while connected < 2 {
        if next_event(&mut events).await == LinkEvent::StateChanged(LinkState::Connected) {
            connected += 1;
        }
    }

    let reading = tokio::time::timeout(WAIT, feed.recv()).await.unwrap().unwrap();
    assert_eq!(reading.zone_id, 3);
    assert_eq!(reading.moisture, Some(44));

    link.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let url = dead_endpoint().await;
    let (link, _feed) = DeviceLink::new(url, fast_retry(Some(1)));
    let mut events = link.events();
    link.connect();

    let mut seen = Vec::new();
    loop {
        let event = next_event(&mut events).await;
        let done = matches!(event, LinkEvent::GaveUp { .. });
        seen.push(event);
        if done {
            break;
        }
    }

    let retries = seen
        .iter()
        .filter(|e| matches!(e, LinkEvent::RetryScheduled { .. }))
        .count();
    assert_eq!(retries, 1);
    assert_eq!(seen.last().unwrap(), &LinkEvent::GaveUp { attempts: 1 });
    assert!(
        !seen
            .iter()
            .any(|e| *e == LinkEvent::StateChanged(LinkState::Connected))
    );

    wait_for_state(&link, LinkState::Disconnected).await;
    tokio::time::timeout(WAIT, async {
        while link.is_running() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn connect_twice_opens_one_connection() {
    let (listener, url) = bind().await;
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = async { while let Some(Ok(_)) = ws.next().await {} } => {}
            _ = listener.accept() => { counter.fetch_add(1, Ordering::SeqCst); }
        }
    });

    let (link, _feed) = DeviceLink::new(url, slow_retry());
    link.connect();
    link.connect();
    link.clone().connect();

    wait_for_state(&link, LinkState::Connected).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 1);

    link.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn disconnect_cancels_pending_retry() {
    let url = dead_endpoint().await;
    let (link, _feed) = DeviceLink::new(url, slow_retry());
    let mut events = link.events();
    link.connect();

    loop {
        if let LinkEvent::RetryScheduled { .. } = next_event(&mut events).await {
            break;
        }
    }

    tokio::time::timeout(Duration::from_secs(1), link.disconnect())
        .await
        .expect("disconnect should not wait out the backoff timer");

    assert_eq!(link.state(), LinkState::Disconnected);
    assert!(!link.is_running());

    // No further attempts after disconnect.
    tokio::time::sleep(Duration::from_millis(50)).await;
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, LinkEvent::StateChanged(LinkState::Connecting)),
            "link kept retrying after disconnect"
        );
    }
}

#[tokio::test]
async fn connect_during_disconnect_keeps_the_new_session() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut first = accept(&listener).await;
        while let Some(Ok(_)) = first.next().await {}
        let mut second = accept(&listener).await;
        while let Some(Ok(_)) = second.next().await {}
    });

    let (link, _feed) = DeviceLink::new(url, slow_retry());
    link.connect();
    wait_for_state(&link, LinkState::Connected).await;

    tokio::join!(link.disconnect(), async {
        tokio::task::yield_now().await;
        link.connect();
    });

    wait_for_state(&link, LinkState::Connected).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(link.state(), LinkState::Connected);
    assert!(link.is_running());

    link.disconnect().await;
    assert_eq!(link.state(), LinkState::Disconnected);
    tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_stops_the_task_without_awaiting() {
    let url = dead_endpoint().await;
    let (link, _feed) = DeviceLink::new(url, slow_retry());
    let mut events = link.events();
    link.connect();

    loop {
        if let LinkEvent::RetryScheduled { .. } = next_event(&mut events).await {
            break;
        }
    }

    link.shutdown();
    assert_eq!(link.state(), LinkState::Disconnected);
    assert!(!link.is_running());

    tokio::time::sleep(Duration::from_millis(50)).await;
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, LinkEvent::StateChanged(LinkState::Connecting)),
            "link kept retrying after shutdown"
        );
    }
}

#[tokio::test]
async fn disconnect_sends_close_frame() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None => return true,
                Some(Ok(_)) => {}
                Some(Err(_)) => return false,
            }
        }
    });

    let (link, _feed) = DeviceLink::new(url, slow_retry());
    link.connect();
    wait_for_state(&link, LinkState::Connected).await;

    link.disconnect().await;
    assert_eq!(link.state(), LinkState::Disconnected);
    assert!(tokio::time::timeout(WAIT, server).await.unwrap().unwrap());
}

// ── Frames ──────────────────────────────────────────────────────────

#[tokio::test]
async fn sensor_feed_preserves_order_and_skips_bad_frames() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        ws.send(sensor_frame(1, 10)).await.unwrap();
        ws.send(Message::text("{definitely not json")).await.unwrap();
        ws.send(Message::text(r#"{"type":"heartbeat","uptime":99}"#))
            .await
            .unwrap();
        ws.send(sensor_frame(2, 20)).await.unwrap();
        ws.send(Message::binary(
            br#"{"type":"sensor_data","data":{"zoneId":3,"active":true}}"#.to_vec(),
        ))
        .await
        .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (link, mut feed) = DeviceLink::new(url, slow_retry());
    let mut events = link.events();
    link.connect();

    let mut zones = Vec::new();
    for _ in 0..3 {
        let reading = tokio::time::timeout(WAIT, feed.recv()).await.unwrap().unwrap();
        zones.push(reading.zone_id);
    }
    assert_eq!(zones, vec![1, 2, 3]);
    assert!(feed.try_recv().is_none());

    let mut rejected = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, LinkEvent::FrameRejected { .. }) {
            rejected += 1;
        }
    }
    assert_eq!(rejected, 1);
    assert_eq!(link.state(), LinkState::Connected);

    link.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn toggle_command_reaches_server() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_owned(),
                Some(Ok(_)) => {}
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    });

    let (link, _feed) = DeviceLink::new(url, slow_retry());
    link.connect();
    wait_for_state(&link, LinkState::Connected).await;

    link.send(&OutboundCommand::ToggleZone {
        zone_id: 3,
        active: false,
    })
    .unwrap();

    let frame = tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(frame, r#"{"type":"toggle_zone","zoneId":3,"active":false}"#);

    link.disconnect().await;
}

#[test]
fn send_before_connect_is_rejected() {
    let url = Url::parse("ws://127.0.0.1:9/").unwrap();
    let (link, _feed) = DeviceLink::new(url, ReconnectConfig::default());
    let result = link.send(&OutboundCommand::ToggleZone {
        zone_id: 1,
        active: true,
    });
    assert!(matches!(result, Err(Error::NotConnected)));
}

#[tokio::test]
async fn queued_command_is_flushed_on_disconnect() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let mut frames = Vec::new();
        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                Message::Text(text) => frames.push(text.as_str().to_owned()),
                Message::Close(_) => break,
                _ => {}
            }
        }
        frames
    });

    let (link, _feed) = DeviceLink::new(url, slow_retry());
    link.connect();
    wait_for_state(&link, LinkState::Connected).await;

    link.send(&OutboundCommand::ToggleZone {
        zone_id: 8,
        active: true,
    })
    .unwrap();
    link.disconnect().await;

    let frames = tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(
        frames,
        vec![r#"{"type":"toggle_zone","zoneId":8,"active":true}"#.to_owned()]
    );
}
