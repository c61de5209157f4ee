//! Reconnecting WebSocket client with pub/sub message dispatch
//!
//! This crate provides the real-time link between the game client and the
//! game server: one duplex WebSocket connection, automatic reconnection with
//! exponential backoff, and a topic → handler registry that every inbound
//! frame is dispatched through.
//!
//! # Core Features
//!
//! - **WebSocket Transport**: async connection owned by one background task
//! - **Typed Dispatch**: handlers keyed by [`Topic`](clueline_core::Topic),
//!   lifecycle events and message types through the same mechanism
//! - **Auto-Reconnection**: 1 s, 2 s, 4 s, 8 s, 16 s, then give up
//! - **Session Façade**: observable status, last message and last error
//! - **Observability**: `tracing` logs and OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use clueline_client::{ClientBuilder, Handler};
//! use clueline_core::{message_type, Message, Topic};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new().build()?;
//!
//!     client.on(
//!         message_type::CHAT_MESSAGE,
//!         Handler::new(|event| println!("chat: {:?}", event.data())),
//!     );
//!     client.on(Topic::Disconnected, Handler::new(|event| println!("{:?}", event)));
//!
//!     client.connect("ws://localhost:8080/ws").await?;
//!     client.send(Message::new(message_type::CHAT_MESSAGE, json!("hi")))?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod client_builder;
mod connection_state;
mod dispatcher;
mod metrics;
mod reconnect;
mod registry;
mod session;

pub use client::Client;
pub use client_builder::ClientBuilder;
pub use connection_state::{ConnectionManager, ConnectionState};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use metrics::ClientMetrics;
pub use reconnect::{
    ExponentialBackoff, FixedDelay, NoReconnect, ReconnectionStrategy, DEFAULT_BASE_DELAY,
    DEFAULT_MAX_ATTEMPTS,
};
pub use registry::{Handler, HandlerRegistry, Subscription};
pub use session::Session;
