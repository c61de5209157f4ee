//! Core message and event types
//!
//! # Wire Messages
//!
//! Every structured frame exchanged with the game server is a JSON object
//! with a `type` tag and a free-form `data` payload:
//!
//! ```json
//! {"type": "chat_message", "data": {"from": "detective", "text": "hi"}}
//! ```
//!
//! # Topics and Events
//!
//! Handlers subscribe to a [`Topic`]. Application message types and the
//! link's own lifecycle share the same mechanism, but lifecycle topics are
//! distinct enum variants rather than magic strings, so a `match` over
//! [`Event`] is checked for exhaustiveness by the compiler. The legacy
//! string tags (`__connected__`, `__message__`, ...) are still accepted at
//! the boundary through [`Topic::from_tag`].

use crate::error::{Error, Result};
use crate::message_type;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A structured unit of data exchanged over the link
///
/// Immutable once constructed; clone it to keep a copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl Message {
    /// Create a message from a type tag and a JSON payload
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Create a message whose payload is any serializable value
    pub fn with_data<T: Serialize>(kind: impl Into<String>, data: &T) -> Result<Self> {
        Ok(Self::new(kind, serde_json::to_value(data)?))
    }

    /// Wrap an undecodable inbound frame
    pub fn raw(text: impl Into<String>) -> Self {
        Self::new(message_type::RAW, Value::String(text.into()))
    }

    /// The message type tag
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The message payload
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Consume the message, returning the type tag and the payload
    pub fn into_parts(self) -> (String, Value) {
        (self.kind, self.data)
    }

    /// Deserialize the payload into a concrete type
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone()).map_err(Error::from)
    }

    /// Whether this message wraps a frame that was not structured JSON
    pub fn is_raw(&self) -> bool {
        self.kind == message_type::RAW
    }
}

/// Anything that can be handed to `send()`
///
/// Structured variants are encoded as JSON text; `Text` goes on the wire
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Raw text frame
    Text(String),
    /// Arbitrary JSON value
    Json(Value),
    /// Tagged `{type, data}` message
    Message(Message),
}

impl From<String> for Outbound {
    fn from(text: String) -> Self {
        Outbound::Text(text)
    }
}

impl From<&str> for Outbound {
    fn from(text: &str) -> Self {
        Outbound::Text(text.to_string())
    }
}

impl From<Value> for Outbound {
    fn from(value: Value) -> Self {
        Outbound::Json(value)
    }
}

impl From<Message> for Outbound {
    fn from(message: Message) -> Self {
        Outbound::Message(message)
    }
}

impl Outbound {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &str {
        match self {
            Outbound::Text(_) => "text",
            Outbound::Json(_) => "json",
            Outbound::Message(message) => message.kind(),
        }
    }
}

/// Key under which handlers are registered
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// The channel reached the open state
    Connected,
    /// An open channel was closed by the peer or the network
    Disconnected,
    /// A connection attempt failed
    Error,
    /// Every inbound frame, structured or raw
    AnyMessage,
    /// Inbound messages with this type tag
    Kind(String),
}

impl Topic {
    /// Topic for an application message type
    pub fn kind(kind: impl Into<String>) -> Self {
        Topic::Kind(kind.into())
    }

    /// Parse a string tag, recognising the reserved lifecycle tags
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            message_type::CONNECTED => Topic::Connected,
            message_type::DISCONNECTED => Topic::Disconnected,
            message_type::ERROR_EVENT => Topic::Error,
            message_type::ANY_MESSAGE => Topic::AnyMessage,
            other => Topic::Kind(other.to_string()),
        }
    }

    /// The string tag of this topic
    pub fn as_tag(&self) -> &str {
        match self {
            Topic::Connected => message_type::CONNECTED,
            Topic::Disconnected => message_type::DISCONNECTED,
            Topic::Error => message_type::ERROR_EVENT,
            Topic::AnyMessage => message_type::ANY_MESSAGE,
            Topic::Kind(kind) => kind,
        }
    }

    /// Whether this is one of the link's own lifecycle topics
    pub fn is_lifecycle(&self) -> bool {
        !matches!(self, Topic::Kind(_))
    }
}

impl From<&str> for Topic {
    fn from(tag: &str) -> Self {
        Topic::from_tag(tag)
    }
}

impl From<String> for Topic {
    fn from(tag: String) -> Self {
        Topic::from_tag(&tag)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Why an open channel went away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// `disconnect()` was called
    Manual,
    /// The peer sent a close frame or ended the stream
    Remote {
        /// Close code from the peer's close frame, if any
        code: Option<u16>,
        /// Close reason text from the peer's close frame
        reason: String,
    },
    /// The transport failed
    Error(String),
}

impl CloseReason {
    /// Whether this close should trigger reconnection
    pub fn is_unplanned(&self) -> bool {
        !matches!(self, CloseReason::Manual)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Manual => f.write_str("closed by client"),
            CloseReason::Remote { code: Some(code), reason } => {
                write!(f, "closed by peer ({}): {}", code, reason)
            }
            CloseReason::Remote { code: None, reason } => write!(f, "closed by peer: {}", reason),
            CloseReason::Error(err) => write!(f, "transport error: {}", err),
        }
    }
}

/// What a handler receives
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Delivered on [`Topic::Connected`]
    Connected,
    /// Delivered on [`Topic::Disconnected`]
    Disconnected { reason: CloseReason },
    /// Delivered on [`Topic::Error`]
    Error(Error),
    /// The full inbound message, delivered on [`Topic::AnyMessage`]
    Message(Message),
    /// The payload of an inbound message, delivered on [`Topic::Kind`]
    Payload { kind: String, data: Value },
}

impl Event {
    /// The topic this event is dispatched on
    pub fn topic(&self) -> Topic {
        match self {
            Event::Connected => Topic::Connected,
            Event::Disconnected { .. } => Topic::Disconnected,
            Event::Error(_) => Topic::Error,
            Event::Message(_) => Topic::AnyMessage,
            Event::Payload { kind, .. } => Topic::Kind(kind.clone()),
        }
    }

    /// Message payload, for message-carrying events
    pub fn data(&self) -> Option<&Value> {
        match self {
            Event::Payload { data, .. } => Some(data),
            Event::Message(message) => Some(message.data()),
            _ => None,
        }
    }

    /// The full message, for [`Event::Message`]
    pub fn message(&self) -> Option<&Message> {
        match self {
            Event::Message(message) => Some(message),
            _ => None,
        }
    }

    /// The error, for [`Event::Error`]
    pub fn error(&self) -> Option<&Error> {
        match self {
            Event::Error(err) => Some(err),
            _ => None,
        }
    }
}
