//! Message dispatcher
//!
//! Converts inbound frames into events and runs the handlers registered
//! for them.
//!
//! # Dispatch Order
//!
//! For each inbound frame:
//!
//! 1. The full message is broadcast on `Topic::AnyMessage`, so generic
//!    observers always see the rawest view first.
//! 2. If the frame was a structured `{type, data}` message, its payload is
//!    delivered on `Topic::Kind(type)`.
//!
//! Frames that did not decode are broadcast as `raw` messages and are never
//! routed to type-specific handlers.
//!
//! Within a topic, handlers run in registration order over a snapshot taken
//! when dispatch starts. A panicking handler is logged and skipped; the rest
//! still run.

use crate::metrics::ClientMetrics;
use crate::registry::HandlerRegistry;
use clueline_core::codec::{self, Inbound};
use clueline_core::Event;
use std::any::Any;
use std::ops::AddAssign;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Outcome of one dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that returned normally
    pub invoked: usize,
    /// Handlers that panicked
    pub failed: usize,
}

impl AddAssign for DispatchReport {
    fn add_assign(&mut self, other: Self) {
        self.invoked += other.invoked;
        self.failed += other.failed;
    }
}

/// Routes events to the handlers in a [`HandlerRegistry`]
#[derive(Clone)]
pub struct Dispatcher {
    registry: HandlerRegistry,
    metrics: Option<Arc<ClientMetrics>>,
}

impl Dispatcher {
    /// Dispatcher over `registry`
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            metrics: None,
        }
    }

    pub(crate) fn with_metrics(mut self, metrics: Option<Arc<ClientMetrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    /// The registry handlers are looked up in
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Decode one inbound text frame and route it
    pub fn handle_frame(&self, text: &str) -> DispatchReport {
        let inbound = codec::decode(text);

        if let Some(ref m) = self.metrics {
            m.record_frame_received(inbound.message().kind(), inbound.is_raw());
        }

        match inbound {
            Inbound::Structured(message) => {
                tracing::debug!(kind = %message.kind(), "Message received");
                let mut report = self.emit(&Event::Message(message.clone()));
                let (kind, data) = message.into_parts();
                report += self.emit(&Event::Payload { kind, data });
                report
            }
            Inbound::Raw(message) => {
                tracing::debug!(len = text.len(), "Undecodable frame received, delivering as raw");
                self.emit(&Event::Message(message))
            }
        }
    }

    /// Run every handler registered for the event's topic
    pub fn emit(&self, event: &Event) -> DispatchReport {
        let topic = event.topic();
        let mut report = DispatchReport::default();

        for handler in self.registry.handlers(&topic) {
            match catch_unwind(AssertUnwindSafe(|| handler.call(event))) {
                Ok(()) => report.invoked += 1,
                Err(panic) => {
                    report.failed += 1;
                    tracing::warn!(
                        topic = %topic,
                        panic = %panic_message(panic.as_ref()),
                        "Handler panicked"
                    );
                    if let Some(ref m) = self.metrics {
                        m.record_handler_failure(&topic);
                    }
                }
            }
        }

        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
