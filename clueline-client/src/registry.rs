//! Subscription registry
//!
//! Maps each [`Topic`] to the ordered list of handlers registered for it.
//! The dispatcher asks for a snapshot of a topic's list and runs it after
//! the lock is released, so handlers may call `on`/`off`/`clear` on the
//! same registry while a dispatch is in progress.
//!
//! # Handler Identity
//!
//! A [`Handler`] is a shared closure. Clones of one handler are the same
//! handler: registering it twice makes it run twice per dispatch, and `off`
//! removes the first registration of exactly that handler.
//!
//! # Examples
//!
//! ```rust
//! use clueline_client::{Handler, HandlerRegistry};
//! use clueline_core::Topic;
//!
//! let registry = HandlerRegistry::new();
//! let handler = Handler::new(|event| println!("{:?}", event));
//!
//! registry.on(Topic::kind("chat_message"), handler.clone());
//! assert_eq!(registry.count(&Topic::kind("chat_message")), 1);
//!
//! assert!(registry.off(&Topic::kind("chat_message"), &handler));
//! assert!(registry.is_empty());
//! ```

use clueline_core::{Event, Topic};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registered callback
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(&Event) + Send + Sync>);

impl Handler {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Whether `other` is a clone of this handler
    pub fn same(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Topic → ordered handler list
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<Mutex<HashMap<Topic, Vec<Handler>>>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `topic`
    pub fn on(&self, topic: impl Into<Topic>, handler: Handler) {
        self.handlers
            .lock()
            .entry(topic.into())
            .or_default()
            .push(handler);
    }

    /// Remove the first registration of `handler` for `topic`
    ///
    /// Returns `false` if nothing matched.
    pub fn off(&self, topic: &Topic, handler: &Handler) -> bool {
        let mut handlers = self.handlers.lock();
        let Some(list) = handlers.get_mut(topic) else {
            return false;
        };
        let Some(index) = list.iter().position(|h| h.same(handler)) else {
            return false;
        };

        list.remove(index);
        if list.is_empty() {
            handlers.remove(topic);
        }
        true
    }

    /// Remove every registration
    pub fn clear(&self) {
        self.handlers.lock().clear();
    }

    /// Snapshot of the handlers for `topic`, in registration order
    pub fn handlers(&self, topic: &Topic) -> Vec<Handler> {
        self.handlers
            .lock()
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of registrations for `topic`
    pub fn count(&self, topic: &Topic) -> usize {
        self.handlers.lock().get(topic).map_or(0, Vec::len)
    }

    /// Topics with at least one registration
    pub fn topics(&self) -> Vec<Topic> {
        self.handlers.lock().keys().cloned().collect()
    }

    /// Total number of registrations
    pub fn len(&self) -> usize {
        self.handlers.lock().values().map(Vec::len).sum()
    }

    /// Whether there are no registrations
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }

    /// Register `handler` and return a guard that unregisters it on drop
    pub fn subscribe(&self, topic: impl Into<Topic>, handler: Handler) -> Subscription {
        let topic = topic.into();
        self.on(topic.clone(), handler.clone());
        Subscription {
            registry: self.clone(),
            topic,
            handler,
            active: true,
        }
    }
}

/// Registration that lasts as long as the guard
///
/// Dropping the guard unregisters the handler. Call [`Subscription::detach`]
/// to keep it registered for the lifetime of the registry instead.
#[must_use = "dropping a Subscription unregisters its handler"]
pub struct Subscription {
    registry: HandlerRegistry,
    topic: Topic,
    handler: Handler,
    active: bool,
}

impl Subscription {
    /// The subscribed topic
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// The registered handler
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Unregister now
    pub fn unsubscribe(mut self) -> bool {
        self.active = false;
        self.registry.off(&self.topic, &self.handler)
    }

    /// Keep the handler registered after the guard is dropped
    pub fn detach(mut self) -> Handler {
        self.active = false;
        self.handler.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.active {
            self.registry.off(&self.topic, &self.handler);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("active", &self.active)
            .finish()
    }
}
