//! Automatic reconnection
//!
//! Connects through a [`Session`], then reports status changes while the
//! client retries with exponential backoff.
//!
//! ```bash
//! cargo run --example reconnection_client -- ws://127.0.0.1:8080/ws
//! ```
//!
//! Stop and restart the server to watch the link recover; after five failed
//! attempts the client gives up until the next `connect()`.

use clueline::client::ExponentialBackoff;
use clueline::core::message_type;
use clueline::{ClientBuilder, ConnectionState, Message, Session};
use serde_json::json;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("clueline_client=debug,info"))
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8080/ws".to_string());

    println!("=== Automatic Reconnection Example ===\n");

    let strategy = ExponentialBackoff::new(Duration::from_secs(1))
        .with_max_attempts(5)
        .with_max_delay(Duration::from_secs(10))
        .with_jitter();

    let client = ClientBuilder::new().with_reconnect(Box::new(strategy)).build()?;
    let mut state = client.watch_state();
    let session = Session::new(client);

    if !session.connect(url.as_str()).await {
        println!("✗ Could not connect: {:?}", *session.last_error().borrow());
        return Ok(());
    }
    println!("✓ Connected\n");
    println!("Try stopping and restarting the server. Press Ctrl+C to exit.\n");

    let mut counter = 1u32;
    let mut ticker = tokio::time::interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = state.borrow_and_update().clone();
                println!("Connection state: {:?}", current);
                if current == ConnectionState::Failed {
                    println!("✗ Gave up reconnecting");
                    break;
                }
            }
            _ = ticker.tick() => {
                let sent = session.send(Message::new(
                    message_type::PLAYER_ACTION,
                    json!({"action": "heartbeat", "seq": counter}),
                ));
                println!("[{}] {}", counter, if sent { "✓ sent" } else { "✗ not connected" });
                counter += 1;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.disconnect();
    Ok(())
}
