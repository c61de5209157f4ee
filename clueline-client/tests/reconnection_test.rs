//! Client reconnection integration tests
//!
//! Tests for automatic reconnection, backoff exhaustion and cancellation.
//! Backoff bases are in milliseconds so the schedule plays out quickly.

mod common;

use clueline_client::{Client, ClientBuilder, ConnectionState, ExponentialBackoff, Handler};
use clueline_core::{CloseReason, Error, Event, Message, Topic};
use common::{event_channel, next_event, refused_url, stays_quiet, wait_until, MockWsServer};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;

fn client_with_backoff(base_ms: u64, max_attempts: u32) -> Client {
    ClientBuilder::new()
        .with_reconnect(Box::new(
            ExponentialBackoff::new(Duration::from_millis(base_ms)).with_max_attempts(max_attempts),
        ))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_remote_close_reconnects_and_keeps_handlers() {
    let server = MockWsServer::new().await;
    let client = client_with_backoff(50, 5);

    let (lifecycle, mut lifecycle_rx) = event_channel();
    let (any, mut any_rx) = event_channel();
    client.on(Topic::Connected, lifecycle.clone());
    client.on(Topic::Disconnected, lifecycle);
    client.on(Topic::AnyMessage, any);

    client.connect(server.url()).await.unwrap();
    assert_eq!(next_event(&mut lifecycle_rx).await, Some(Event::Connected));

    server.close_all();

    assert_eq!(
        next_event(&mut lifecycle_rx).await,
        Some(Event::Disconnected {
            reason: CloseReason::Remote {
                code: Some(1000),
                reason: "server closing".into(),
            }
        })
    );
    assert_eq!(next_event(&mut lifecycle_rx).await, Some(Event::Connected));

    assert_eq!(client.state(), ConnectionState::Open);
    assert_eq!(client.reconnect_attempts(), 0);
    assert_eq!(server.connection_count(), 2);

    server.push(r#"{"type":"game_start","data":null}"#);
    assert_eq!(
        next_event(&mut any_rx).await,
        Some(Event::Message(Message::new("game_start", json!(null))))
    );

    client.disconnect();
    server.shutdown().await;
}

#[tokio::test]
async fn test_exhaustion_enters_failed() {
    let client = client_with_backoff(10, 3);
    let (errors, mut errors_rx) = event_channel();
    client.on(Topic::Error, errors);

    let result = client.connect(refused_url().await).await;
    assert!(matches!(result, Err(Error::WebSocket(_))));

    let mut state = client.watch_state();
    assert!(wait_until(&mut state, |s| *s == ConnectionState::Failed).await);

    // The first attempt plus three retries
    for _ in 0..4 {
        assert!(matches!(
            next_event(&mut errors_rx).await,
            Some(Event::Error(Error::WebSocket(_)))
        ));
    }
    assert!(stays_quiet(&mut errors_rx, Duration::from_millis(100)).await);
    assert_eq!(client.reconnect_attempts(), 3);
}

#[tokio::test]
async fn test_send_while_reconnecting_fails() {
    let client = client_with_backoff(300, 5);
    let _ = client.connect(refused_url().await).await;

    let mut state = client.watch_state();
    assert!(wait_until(&mut state, |s| *s == ConnectionState::Reconnecting { attempt: 1 }).await);
    assert_eq!(client.send("hello"), Err(Error::NotConnected));

    client.disconnect();
}

#[tokio::test]
async fn test_disconnect_cancels_pending_reconnect() {
    let client = client_with_backoff(300, 5);
    let _ = client.connect(refused_url().await).await;

    let mut state = client.watch_state();
    assert!(wait_until(&mut state, |s| matches!(s, ConnectionState::Reconnecting { .. })).await);

    client.disconnect();
    assert_eq!(client.state(), ConnectionState::Idle);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(client.state(), ConnectionState::Idle);
    assert_eq!(client.reconnect_attempts(), 0);
}

#[tokio::test]
async fn test_disconnect_then_connect_restarts_backoff() {
    let client = client_with_backoff(200, 1);
    let url = refused_url().await;

    let _ = client.connect(url.clone()).await;
    let mut state = client.watch_state();
    assert!(wait_until(&mut state, |s| *s == ConnectionState::Failed).await);
    assert_eq!(client.reconnect_attempts(), 1);

    client.disconnect();
    assert_eq!(client.reconnect_attempts(), 0);

    let _ = client.connect(url).await;
    assert!(wait_until(&mut state, |s| *s == ConnectionState::Reconnecting { attempt: 1 }).await);

    client.disconnect();
}

#[tokio::test]
async fn test_connect_after_exhaustion_keeps_budget() {
    let client = client_with_backoff(10, 1);
    let url = refused_url().await;

    let _ = client.connect(url.clone()).await;
    let mut state = client.watch_state();
    assert!(wait_until(&mut state, |s| *s == ConnectionState::Failed).await);

    let result = client.connect(url).await;
    assert!(matches!(result, Err(Error::WebSocket(_))));
    assert!(wait_until(&mut state, |s| *s == ConnectionState::Failed).await);
    assert_eq!(client.reconnect_attempts(), 1);
}

#[tokio::test]
async fn test_no_reconnect_fails_after_remote_close() {
    let server = MockWsServer::new().await;
    let client = ClientBuilder::new().without_reconnect().build().unwrap();
    let (closed, mut closed_rx) = event_channel();
    client.on(Topic::Disconnected, closed);

    client.connect(server.url()).await.unwrap();
    server.close_all();

    assert!(matches!(
        next_event(&mut closed_rx).await,
        Some(Event::Disconnected { .. })
    ));
    let mut state = client.watch_state();
    assert!(wait_until(&mut state, |s| *s == ConnectionState::Failed).await);
    assert_eq!(server.connection_count(), 1);

    server.shutdown().await;
}

fn state_recorder(client: &Client) -> (Handler, mpsc::UnboundedReceiver<(bool, ConnectionState)>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let observed = client.clone();
    let handler = Handler::new(move |_| {
        let _ = tx.send((observed.is_connected(), observed.state()));
    });
    (handler, rx)
}

#[tokio::test]
async fn test_disconnected_handler_sees_closed_state() {
    let server = MockWsServer::new().await;
    let client = ClientBuilder::new().without_reconnect().build().unwrap();
    let (recorder, mut seen) = state_recorder(&client);
    client.on(Topic::Disconnected, recorder);

    client.connect(server.url()).await.unwrap();
    server.close_all();

    let observed = tokio::time::timeout(common::TIMEOUT, seen.recv()).await.ok().flatten();
    assert_eq!(observed, Some((false, ConnectionState::Failed)));

    server.shutdown().await;
}

#[tokio::test]
async fn test_disconnected_handler_sees_pending_reconnect() {
    let server = MockWsServer::new().await;
    let client = client_with_backoff(50, 5);
    let (recorder, mut seen) = state_recorder(&client);
    client.on(Topic::Disconnected, recorder);

    client.connect(server.url()).await.unwrap();
    server.close_all();

    let observed = tokio::time::timeout(common::TIMEOUT, seen.recv()).await.ok().flatten();
    assert_eq!(
        observed,
        Some((false, ConnectionState::Reconnecting { attempt: 1 }))
    );

    client.disconnect();
    server.shutdown().await;
}

#[tokio::test]
async fn test_error_handler_sees_settled_state() {
    let client = ClientBuilder::new().without_reconnect().build().unwrap();
    let (recorder, mut seen) = state_recorder(&client);
    client.on(Topic::Error, recorder);

    assert!(client.connect(refused_url().await).await.is_err());

    let observed = tokio::time::timeout(common::TIMEOUT, seen.recv()).await.ok().flatten();
    assert_eq!(observed, Some((false, ConnectionState::Failed)));
}

#[tokio::test]
async fn test_reconnect_after_server_restart() {
    let server = MockWsServer::new().await;
    let addr = server.addr();
    let client = client_with_backoff(50, 5);

    client.connect(server.url()).await.unwrap();
    server.shutdown().await;

    let restarted = MockWsServer::bind(addr).await;
    let mut state = client.watch_state();

    let reconnected = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if restarted.connection_count() > 0 && client.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(reconnected.is_ok());
    assert!(wait_until(&mut state, |s| *s == ConnectionState::Open).await);

    client.disconnect();
    restarted.shutdown().await;
}
