//! Frame codec
//!
//! Turns inbound text frames into [`Message`]s and outbound values into
//! text frames.
//!
//! # Decoding Never Fails
//!
//! The game server mostly speaks `{type, data}` JSON, but a frame that is
//! not valid JSON, or valid JSON without a string `type` field, is still
//! delivered: it becomes a `raw` message whose payload is the original
//! frame text. Callers therefore get an [`Inbound`] rather than a `Result`.
//!
//! # Examples
//!
//! ```rust
//! use clueline_core::codec::{self, Inbound};
//!
//! match codec::decode(r#"{"type":"chat_message","data":"hi"}"#) {
//!     Inbound::Structured(message) => assert_eq!(message.kind(), "chat_message"),
//!     Inbound::Raw(_) => unreachable!(),
//! }
//!
//! let raw = codec::decode("not json");
//! assert!(raw.is_raw());
//! assert_eq!(raw.message().kind(), "raw");
//! ```

use crate::error::Result;
use crate::types::{Message, Outbound};
use serde_json::Value;

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A `{type, data}` object
    Structured(Message),
    /// Anything else, wrapped as a `raw` message
    Raw(Message),
}

impl Inbound {
    /// The message view of the frame
    pub fn message(&self) -> &Message {
        match self {
            Inbound::Structured(message) | Inbound::Raw(message) => message,
        }
    }

    /// Consume the frame, returning its message view
    pub fn into_message(self) -> Message {
        match self {
            Inbound::Structured(message) | Inbound::Raw(message) => message,
        }
    }

    /// Whether the frame could not be decoded as a tagged message
    pub fn is_raw(&self) -> bool {
        matches!(self, Inbound::Raw(_))
    }
}

/// Decode an inbound text frame
pub fn decode(text: &str) -> Inbound {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(mut object)) => match object.remove("type") {
            Some(Value::String(kind)) => {
                let data = object.remove("data").unwrap_or(Value::Null);
                Inbound::Structured(Message::new(kind, data))
            }
            _ => Inbound::Raw(Message::raw(text)),
        },
        _ => Inbound::Raw(Message::raw(text)),
    }
}

/// Encode an outbound value as a text frame
///
/// Raw text is passed through untouched.
pub fn encode(outbound: &Outbound) -> Result<String> {
    match outbound {
        Outbound::Text(text) => Ok(text.clone()),
        Outbound::Json(value) => Ok(serde_json::to_string(value)?),
        Outbound::Message(message) => Ok(serde_json::to_string(message)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_structured() {
        let inbound = decode(r#"{"type":"clue_found","data":{"clue":"bloody glove"}}"#);
        assert!(!inbound.is_raw());
        let message = inbound.into_message();
        assert_eq!(message.kind(), "clue_found");
        assert_eq!(message.data(), &json!({"clue": "bloody glove"}));
    }

    #[test]
    fn test_decode_extra_fields_are_ignored() {
        let inbound = decode(r#"{"type":"turn_change","data":3,"ts":1700000000}"#);
        assert_eq!(inbound.message(), &Message::new("turn_change", json!(3)));
    }

    #[test]
    fn test_decode_missing_data() {
        let inbound = decode(r#"{"type":"game_start"}"#);
        assert_eq!(inbound.message(), &Message::new("game_start", Value::Null));
    }

    #[test]
    fn test_decode_not_json() {
        let inbound = decode("not json");
        assert!(inbound.is_raw());
        assert_eq!(inbound.message(), &Message::raw("not json"));
    }

    #[test]
    fn test_decode_json_without_type() {
        for text in [r#"{"data":1}"#, r#"{"type":7}"#, "[1,2,3]", "42", "\"quoted\""] {
            let inbound = decode(text);
            assert!(inbound.is_raw(), "{} should decode as raw", text);
            assert_eq!(inbound.message().data(), &json!(text));
        }
    }

    #[test]
    fn test_encode_text_is_verbatim() {
        let text = encode(&Outbound::from("hello detective")).unwrap();
        assert_eq!(text, "hello detective");
    }

    #[test]
    fn test_encode_message() {
        let outbound = Outbound::from(Message::new("vote_cast", json!({"suspect": 2})));
        let text = encode(&outbound).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"type": "vote_cast", "data": {"suspect": 2}}));
    }

    #[test]
    fn test_encode_json_value() {
        let text = encode(&Outbound::from(json!({"type": "player_ready"}))).unwrap();
        assert_eq!(text, r#"{"type":"player_ready"}"#);
    }
}
