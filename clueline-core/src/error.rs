//! Error types for clueline
//!
//! Only connect-time failures are handed back to the caller of `connect()`.
//! Everything that happens while the link is running (decode problems,
//! handler panics, reconnect failures) is absorbed by the client and shows
//! up as lifecycle events or log records instead.
//!
//! # Error Categories
//!
//! - **Caller errors**: InvalidAddress
//! - **Transport errors**: WebSocket, ConnectionClosed, NotConnected
//! - **Encoding errors**: Serialization
//! - **Lifecycle errors**: Cancelled
//!
//! # Examples
//!
//! ```rust
//! use clueline_core::Error;
//!
//! let error = Error::InvalidAddress("address is required".into());
//! assert!(error.is_caller_error());
//! ```

use thiserror::Error;

/// Result type for clueline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for clueline operations
///
/// The type is `Clone` so that one connection attempt can hand the same
/// outcome to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The endpoint address was empty or otherwise unusable
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// WebSocket transport layer error
    ///
    /// Covers handshake failures, refused connections and protocol
    /// violations reported by the transport.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// A send was attempted while the channel is not open
    ///
    /// The message is dropped, never queued.
    #[error("Not connected")]
    NotConnected,

    /// The connection went away before the operation could finish
    #[error("Connection closed")]
    ConnectionClosed,

    /// The connection attempt was superseded by `disconnect()` or by a
    /// newer `connect()`
    #[error("Connection attempt cancelled")]
    Cancelled,

    /// Outbound payload could not be encoded as JSON text
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unexpected internal condition
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error was caused by the caller's input rather than by
    /// the network or the peer
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Error::InvalidAddress(_) | Error::Serialization(_))
    }

    /// Whether the error came from the transport
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Error::WebSocket(_) | Error::ConnectionClosed | Error::NotConnected
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::InvalidAddress("address is required".into()).to_string(),
            "Invalid address: address is required"
        );
        assert_eq!(Error::NotConnected.to_string(), "Not connected");
        assert_eq!(
            Error::WebSocket("refused".into()).to_string(),
            "WebSocket error: refused"
        );
        assert_eq!(Error::Cancelled.to_string(), "Connection attempt cancelled");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::InvalidAddress(String::new()).is_caller_error());
        assert!(Error::Serialization("bad".into()).is_caller_error());
        assert!(!Error::NotConnected.is_caller_error());

        assert!(Error::WebSocket("x".into()).is_transport_error());
        assert!(Error::ConnectionClosed.is_transport_error());
        assert!(Error::NotConnected.is_transport_error());
        assert!(!Error::Cancelled.is_transport_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(converted, Error::Serialization(_)));
    }
}
