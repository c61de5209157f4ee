//! clueline - real-time link for the script-murder-mystery game client
//!
//! This is the convenience crate that re-exports the clueline sub-crates.
//! Depend on it when you want the whole client behind a single dependency.
//!
//! # Architecture
//!
//! - **clueline-core**: message types, frame codec, errors, observability
//! - **clueline-client**: connection manager, dispatcher, subscription
//!   registry, reconnection and the [`Session`] façade
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use clueline::{ClientBuilder, Handler, Session};
//! use clueline::core::{message_type, Message};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     clueline::core::init_logging("info")?;
//!
//!     let session = Session::new(ClientBuilder::new().build()?);
//!     session.on(
//!         message_type::PHASE_CHANGE,
//!         Handler::new(|event| println!("phase: {:?}", event.data())),
//!     );
//!
//!     if session.connect("ws://localhost:8080/ws").await {
//!         session.send(Message::new(message_type::PLAYER_READY, json!(true)));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub use clueline_client as client;
pub use clueline_core as core;

pub use clueline_client::{Client, ClientBuilder, ConnectionState, Handler, Session, Subscription};
pub use clueline_core::{CloseReason, Error, Event, Message, Outbound, Result, Topic};
