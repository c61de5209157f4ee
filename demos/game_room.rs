//! Game room client
//!
//! Joins a room, listens for chat and phase changes, shares a clue and
//! casts a vote.
//!
//! Point it at any server speaking `{type, data}` JSON frames:
//! ```bash
//! cargo run --example game_room -- ws://127.0.0.1:8080/ws
//! ```

use clueline::core::message_type;
use clueline::{ClientBuilder, Event, Message, Topic};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct ChatLine {
    from: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct SharedClue {
    clue_id: u32,
    note: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8080/ws".to_string());

    println!("=== Game Room Example ===\n");

    let client = ClientBuilder::new().build()?;

    client.on_fn(message_type::CHAT_MESSAGE, |event| {
        let Some(data) = event.data() else { return };
        match serde_json::from_value::<ChatLine>(data.clone()) {
            Ok(line) => println!("💬 {}: {}", line.from, line.text),
            Err(e) => tracing::warn!(error = %e, "Malformed chat line"),
        }
    });
    client.on_fn(message_type::PHASE_CHANGE, |event| {
        println!("🕯  Phase changed: {:?}", event.data());
    });
    client.on_fn(Topic::AnyMessage, |event| {
        if let Event::Message(message) = event {
            tracing::debug!(kind = message.kind(), "Frame received");
        }
    });
    client.on_fn(Topic::Disconnected, |event| {
        println!("⚠  Connection lost: {:?}", event);
    });

    println!("Connecting to {}...", url);
    client.connect(url.as_str()).await?;
    println!("✓ Connected\n");

    client.send(Message::new(message_type::GAME_JOIN, json!({"room": "manor"})))?;
    client.send(Message::new(message_type::PLAYER_READY, json!(true)))?;

    let line = ChatLine {
        from: "detective".to_string(),
        text: "Who was in the library?".to_string(),
    };
    client.send(Message::new(message_type::CHAT_MESSAGE, serde_json::to_value(&line)?))?;

    let clue = SharedClue {
        clue_id: 7,
        note: "Muddy footprints by the window".to_string(),
    };
    client.send(Message::new(message_type::CLUE_SHARE, serde_json::to_value(&clue)?))?;
    client.send(Message::new(message_type::VOTE_CAST, json!({"suspect": 3})))?;

    tokio::time::sleep(Duration::from_secs(5)).await;

    client.send(Message::new(message_type::GAME_LEAVE, json!(null)))?;
    client.disconnect();
    println!("\n✓ Left the room");

    Ok(())
}
