//! Client metrics definitions
//!
//! OpenTelemetry instruments for the link and the dispatcher. They are
//! exported through whatever meter provider `init_observability` installed;
//! without one, recording is a no-op.
//!
//! # Metrics Collected
//!
//! - **connection.state**: current [`ConnectionState`](crate::ConnectionState) code (gauge)
//! - **frames.sent**: outbound frames handed to the socket (counter)
//! - **frames.received**: inbound text frames, by message type (counter)
//! - **frames.raw**: inbound frames that did not decode (counter)
//! - **send.failures**: `send` calls rejected, by reason (counter)
//! - **handler.failures**: handlers that panicked, by topic (counter)
//! - **errors**: transport errors (counter)
//! - **reconnection.attempts** / **reconnection.success** (counters)
//!
//! # Examples
//!
//! ```rust,no_run
//! use clueline_client::ClientMetrics;
//!
//! let metrics = ClientMetrics::new("game-client");
//! metrics.record_frame_sent("chat_message");
//! ```

use clueline_core::Topic;
use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Meter},
    KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Connection state (0=idle, 1=connecting, 2=open, 3=reconnecting, 4=failed)
    pub connection_state: Gauge<i64>,
    pub frames_sent: Counter<u64>,
    pub frames_received: Counter<u64>,
    pub raw_frames: Counter<u64>,
    pub send_failures: Counter<u64>,
    pub handler_failures: Counter<u64>,
    pub errors_total: Counter<u64>,
    pub reconnection_attempts: Counter<u64>,
    pub reconnection_success: Counter<u64>,
}

impl ClientMetrics {
    /// Instruments on the global meter named `service_name`
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Instruments on a caller-supplied meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("clueline.client.connection.state")
                .with_description("Connection state (0=idle, 1=connecting, 2=open, 3=reconnecting, 4=failed)")
                .build(),
            frames_sent: meter
                .u64_counter("clueline.client.frames.sent")
                .with_description("Outbound frames written")
                .build(),
            frames_received: meter
                .u64_counter("clueline.client.frames.received")
                .with_description("Inbound text frames dispatched")
                .build(),
            raw_frames: meter
                .u64_counter("clueline.client.frames.raw")
                .with_description("Inbound frames delivered as raw messages")
                .build(),
            send_failures: meter
                .u64_counter("clueline.client.send.failures")
                .with_description("Send calls rejected before reaching the socket")
                .build(),
            handler_failures: meter
                .u64_counter("clueline.client.handler.failures")
                .with_description("Handlers that panicked during dispatch")
                .build(),
            errors_total: meter
                .u64_counter("clueline.client.errors.total")
                .with_description("Transport errors")
                .build(),
            reconnection_attempts: meter
                .u64_counter("clueline.client.reconnection.attempts")
                .with_description("Reconnection attempts started")
                .build(),
            reconnection_success: meter
                .u64_counter("clueline.client.reconnection.success")
                .with_description("Reconnection attempts that opened the link")
                .build(),
        }
    }

    pub fn update_connection_state(&self, state: i64) {
        self.connection_state.record(state, &[]);
    }

    pub fn record_frame_sent(&self, kind: &str) {
        self.frames_sent
            .add(1, &[KeyValue::new("type", kind.to_string())]);
    }

    /// Record one inbound frame; raw frames are also counted separately
    pub fn record_frame_received(&self, kind: &str, raw: bool) {
        self.frames_received
            .add(1, &[KeyValue::new("type", kind.to_string())]);
        if raw {
            self.raw_frames.add(1, &[]);
        }
    }

    pub fn record_send_failure(&self, reason: &str) {
        self.send_failures
            .add(1, &[KeyValue::new("reason", reason.to_string())]);
    }

    pub fn record_handler_failure(&self, topic: &Topic) {
        self.handler_failures
            .add(1, &[KeyValue::new("topic", topic.to_string())]);
    }

    pub fn record_error(&self, error_type: &str) {
        self.errors_total
            .add(1, &[KeyValue::new("error_type", error_type.to_string())]);
    }

    pub fn record_reconnection_attempt(&self) {
        self.reconnection_attempts.add(1, &[]);
    }

    pub fn record_reconnection_success(&self) {
        self.reconnection_success.add(1, &[]);
    }
}
