//! Application-facing session
//!
//! [`Session`] wraps a [`Client`] for UI code: operations report success as
//! a plain `bool`, and the connection status, the most recent message and
//! the most recent error are exposed as `watch` receivers the UI can await
//! or poll.
//!
//! The session keeps those values current by registering its own
//! observers on the client. `disconnect()` clears every registration, so
//! the observers are installed again on each `connect()`.
//!
//! ```rust,no_run
//! use clueline_client::{ClientBuilder, Session};
//!
//! # async fn example() -> clueline_core::Result<()> {
//! let session = Session::new(ClientBuilder::new().build()?);
//! let mut status = session.status();
//!
//! if session.connect("ws://localhost:8080/ws").await {
//!     status.changed().await.ok();
//!     session.send(serde_json::json!({"type": "player_ready", "data": true}));
//! } else {
//!     eprintln!("{:?}", *session.last_error().borrow());
//! }
//! # Ok(())
//! # }
//! ```

use crate::registry::{Handler, Subscription};
use crate::Client;
use clueline_core::{Event, Message, Outbound, Topic};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

struct Observed {
    status: watch::Sender<bool>,
    last_message: watch::Sender<Option<Message>>,
    last_error: watch::Sender<Option<String>>,
    observers: Mutex<Vec<(Topic, Handler)>>,
}

/// Client plus observable status, last message and last error
#[derive(Clone)]
pub struct Session {
    client: Client,
    observed: Arc<Observed>,
}

impl Session {
    /// Wrap `client`, observing it from now on
    pub fn new(client: Client) -> Self {
        let (status, _) = watch::channel(client.is_connected());
        let (last_message, _) = watch::channel(None);
        let (last_error, _) = watch::channel(None);

        let session = Self {
            client,
            observed: Arc::new(Observed {
                status,
                last_message,
                last_error,
                observers: Mutex::new(Vec::new()),
            }),
        };
        session.install_observers();
        session
    }

    /// (Re-)register the status, message and error observers
    fn install_observers(&self) {
        let mut observers = self.observed.observers.lock();
        for (topic, handler) in observers.drain(..) {
            self.client.off(&topic, &handler);
        }

        let weak = Arc::downgrade(&self.observed);
        let fresh = [
            (Topic::Connected, observer(&weak, |o, _| {
                o.status.send_replace(true);
            })),
            (Topic::Disconnected, observer(&weak, |o, _| {
                o.status.send_replace(false);
            })),
            (Topic::Error, observer(&weak, |o, event| {
                if let Some(err) = event.error() {
                    o.last_error.send_replace(Some(err.to_string()));
                }
            })),
            (Topic::AnyMessage, observer(&weak, |o, event| {
                if let Some(message) = event.message() {
                    o.last_message.send_replace(Some(message.clone()));
                }
            })),
        ];

        for (topic, handler) in fresh {
            self.client.on(topic.clone(), handler.clone());
            observers.push((topic, handler));
        }
    }

    /// Connect to `url`, returning whether the link is open
    ///
    /// Failures are reported through [`Session::last_error`].
    pub async fn connect(&self, url: impl Into<String>) -> bool {
        self.observed.last_error.send_replace(None);
        self.install_observers();

        match self.client.connect(url).await {
            Ok(()) => {
                self.observed.status.send_replace(true);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Session connect failed");
                self.observed.last_error.send_replace(Some(e.to_string()));
                self.observed.status.send_replace(false);
                false
            }
        }
    }

    /// Close the link and drop every handler
    pub fn disconnect(&self) {
        self.client.disconnect();
        self.observed.observers.lock().clear();
        self.observed.status.send_replace(false);
    }

    /// Send one frame, returning whether it was handed to the socket
    pub fn send(&self, outbound: impl Into<Outbound>) -> bool {
        self.client.send(outbound).is_ok()
    }

    /// Register `handler` for `topic`
    pub fn on(&self, topic: impl Into<Topic>, handler: Handler) {
        self.client.on(topic, handler);
    }

    /// Remove the first registration of `handler` for `topic`
    pub fn off(&self, topic: &Topic, handler: &Handler) -> bool {
        self.client.off(topic, handler)
    }

    /// Register `handler` until the returned guard is dropped
    pub fn subscribe(&self, topic: impl Into<Topic>, handler: Handler) -> Subscription {
        self.client.subscribe(topic, handler)
    }

    /// Alias for [`Session::off`]
    pub fn unsubscribe(&self, topic: &Topic, handler: &Handler) -> bool {
        self.off(topic, handler)
    }

    /// Connection status
    pub fn status(&self) -> watch::Receiver<bool> {
        self.observed.status.subscribe()
    }

    /// Last observed connection status
    pub fn is_connected(&self) -> bool {
        *self.observed.status.borrow()
    }

    /// Most recent inbound message, raw frames included
    pub fn last_message(&self) -> watch::Receiver<Option<Message>> {
        self.observed.last_message.subscribe()
    }

    /// Most recent error text
    pub fn last_error(&self) -> watch::Receiver<Option<String>> {
        self.observed.last_error.subscribe()
    }

    /// The wrapped client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn observer<F>(observed: &Weak<Observed>, f: F) -> Handler
where
    F: Fn(&Observed, &Event) + Send + Sync + 'static,
{
    let observed = observed.clone();
    Handler::new(move |event| {
        if let Some(observed) = observed.upgrade() {
            f(&observed, event);
        }
    })
}
