//! Core types and codec for clueline
//!
//! clueline is the real-time link between the script-murder-mystery game
//! client and the game server: one WebSocket, `{type, data}` JSON frames,
//! and a publish/subscribe layer on top. This crate holds the pieces that
//! do not depend on a live connection:
//!
//! - **Types**: [`Message`], [`Outbound`], [`Topic`], [`Event`], [`CloseReason`]
//! - **Codec**: frame decoding (never fails) and encoding
//! - **Message types**: the tags the game protocol defines
//! - **Error handling**: [`Error`] and [`Result`]
//! - **Observability**: logging and OpenTelemetry bootstrap
//!
//! # Example
//!
//! ```rust
//! use clueline_core::{codec, message_type, Message, Outbound};
//! use serde_json::json;
//!
//! let outbound = Outbound::from(Message::new(message_type::CHAT_MESSAGE, json!("hi")));
//! let text = codec::encode(&outbound).unwrap();
//!
//! let inbound = codec::decode(&text);
//! assert_eq!(inbound.message().kind(), "chat_message");
//! ```

pub mod codec;
pub mod error;
pub mod message_type;
pub mod observability;
pub mod types;

pub use error::{Error, Result};
pub use observability::{
    init_logging, init_observability, shutdown_observability, ObservabilityConfig,
};
pub use types::{CloseReason, Event, Message, Outbound, Topic};
