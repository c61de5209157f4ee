//! WebSocket link to the game server
//!
//! This module provides [`Client`], which owns the connection lifecycle,
//! routes inbound frames through the [`Dispatcher`] and writes outbound
//! frames.
//!
//! # Client Lifecycle
//!
//! 1. **Connect**: `connect(url)` opens the channel and resolves once it is open
//! 2. **Use**: `send` frames, register handlers with `on`/`subscribe`
//! 3. **Reconnect**: unplanned closes are retried with backoff
//! 4. **Disconnect**: `disconnect()` closes the channel and clears all handlers
//!
//! # Connection Task
//!
//! Each `connect()` starts a new *generation*: one background task that owns
//! the socket, runs the handlers for every inbound frame, drains the
//! outbound queue and, when the link drops, waits out the backoff and tries
//! again. `disconnect()` or a later `connect()` bumps the generation and the
//! task stops at its next await point. Work finished by a stale generation
//! is discarded.
//!
//! # Cloning
//!
//! `Client` is cheaply cloneable using `Arc` internally. All clones share
//! the same connection, registry and state.

use crate::connection_state::{ConnectionManager, ConnectionState};
use crate::dispatcher::Dispatcher;
use crate::metrics::ClientMetrics;
use crate::reconnect::{ExponentialBackoff, ReconnectionStrategy};
use crate::registry::{Handler, HandlerRegistry, Subscription};
use clueline_core::{codec, CloseReason, Error, Event, Outbound, Result, Topic};
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outcome of an in-flight connection attempt, joinable by later callers
type PendingConnect = Shared<BoxFuture<'static, Result<()>>>;

#[derive(Default)]
struct Link {
    url: Option<String>,
    pending: Option<PendingConnect>,
    outbound: Option<mpsc::UnboundedSender<WsMessage>>,
}

struct Inner {
    manager: ConnectionManager,
    dispatcher: Dispatcher,
    link: Mutex<Link>,
    generation: watch::Sender<u64>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        *self.generation.borrow() == generation
    }

    /// Run `f` under the link lock if `generation` is still the live one
    fn with_current<R>(&self, generation: u64, f: impl FnOnce(&mut Link) -> R) -> Option<R> {
        let mut link = self.link.lock();
        if !self.is_current(generation) {
            return None;
        }
        Some(f(&mut link))
    }

    fn bump_generation(&self) -> u64 {
        let mut next = 0;
        self.generation.send_modify(|generation| {
            *generation = generation.wrapping_add(1);
            next = *generation;
        });
        next
    }

    fn report_state(&self) {
        if let Some(ref m) = self.metrics {
            m.update_connection_state(self.manager.state().as_code());
        }
    }
}

/// Reconnecting WebSocket client with typed pub/sub dispatch
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(Box::new(ExponentialBackoff::default()), None)
    }
}

impl Client {
    pub(crate) fn new(
        strategy: Box<dyn ReconnectionStrategy>,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Self {
        let (generation, _) = watch::channel(0);
        let dispatcher = Dispatcher::new(HandlerRegistry::new()).with_metrics(metrics.clone());
        Self {
            inner: Arc::new(Inner {
                manager: ConnectionManager::new(strategy),
                dispatcher,
                link: Mutex::new(Link::default()),
                generation,
                metrics,
            }),
        }
    }

    /// Open the link to `url`
    ///
    /// Resolves once the channel is open. If it is already open this is a
    /// no-op; if an attempt to the same address is in flight the caller
    /// joins it instead of opening a second channel.
    #[tracing::instrument(skip(self, url), fields(url = tracing::field::Empty))]
    pub async fn connect(&self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        tracing::Span::current().record("url", url.as_str());

        if url.is_empty() {
            return Err(Error::InvalidAddress("address is required".to_string()));
        }

        let pending = {
            let mut link = self.inner.link.lock();

            if self.inner.manager.is_open() {
                tracing::debug!("Already connected");
                return Ok(());
            }

            let joinable = link
                .pending
                .clone()
                .filter(|_| link.url.as_deref() == Some(url.as_str()));

            match joinable {
                Some(pending) => {
                    tracing::debug!("Joining in-flight connection attempt");
                    pending
                }
                None => self.start(&mut link, url),
            }
        };

        pending.await
    }

    fn start(&self, link: &mut Link, url: String) -> PendingConnect {
        let generation = self.inner.bump_generation();
        let (ready_tx, ready_rx) = oneshot::channel();
        let pending = ready_rx
            .map(|outcome| outcome.unwrap_or(Err(Error::ConnectionClosed)))
            .boxed()
            .shared();

        link.url = Some(url.clone());
        link.pending = Some(pending.clone());
        link.outbound = None;

        self.inner.manager.connecting();
        self.inner.report_state();
        tracing::info!(generation, "Connecting to server");

        tokio::spawn(run_connection(
            Arc::clone(&self.inner),
            generation,
            url,
            ready_tx,
        ));

        pending
    }

    /// Close the link and forget every handler
    ///
    /// Handlers are removed before the channel closes, so none of them sees
    /// the close. Pending reconnects are cancelled and the reconnect budget
    /// is restored. Safe to call repeatedly.
    pub fn disconnect(&self) {
        self.inner.dispatcher.registry().clear();

        let mut link = self.inner.link.lock();
        self.inner.bump_generation();
        link.pending = None;
        let was_open = link.outbound.take().is_some();
        self.inner.manager.reset();
        drop(link);

        self.inner.report_state();
        tracing::info!(was_open, reason = %CloseReason::Manual, "Disconnected");
    }

    /// Send one frame
    ///
    /// Never waits. Fails with [`Error::NotConnected`] unless the link is
    /// open; nothing is queued for later.
    pub fn send(&self, outbound: impl Into<Outbound>) -> Result<()> {
        let outbound = outbound.into();

        let writer = {
            let link = self.inner.link.lock();
            link.outbound
                .clone()
                .filter(|_| self.inner.manager.is_open())
        };
        let Some(writer) = writer else {
            tracing::warn!(kind = %outbound.kind(), "Send attempted while not connected");
            if let Some(ref m) = self.inner.metrics {
                m.record_send_failure("not_connected");
            }
            return Err(Error::NotConnected);
        };

        let text = codec::encode(&outbound).map_err(|e| {
            if let Some(ref m) = self.inner.metrics {
                m.record_send_failure("serialization");
            }
            e
        })?;

        writer
            .send(WsMessage::Text(text))
            .map_err(|_| Error::NotConnected)?;

        if let Some(ref m) = self.inner.metrics {
            m.record_frame_sent(outbound.kind());
        }
        tracing::debug!(kind = %outbound.kind(), "Frame queued");
        Ok(())
    }

    /// Register `handler` for `topic`
    pub fn on(&self, topic: impl Into<Topic>, handler: Handler) {
        self.inner.dispatcher.registry().on(topic, handler);
    }

    /// Register a closure for `topic`, returning the handler for a later `off`
    pub fn on_fn<F>(&self, topic: impl Into<Topic>, f: F) -> Handler
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let handler = Handler::new(f);
        self.on(topic, handler.clone());
        handler
    }

    /// Remove the first registration of `handler` for `topic`
    pub fn off(&self, topic: &Topic, handler: &Handler) -> bool {
        self.inner.dispatcher.registry().off(topic, handler)
    }

    /// Register `handler` until the returned guard is dropped
    pub fn subscribe(&self, topic: impl Into<Topic>, handler: Handler) -> Subscription {
        self.inner.dispatcher.registry().subscribe(topic, handler)
    }

    /// The handler registry shared by every clone of this client
    pub fn registry(&self) -> &HandlerRegistry {
        self.inner.dispatcher.registry()
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.inner.manager.state()
    }

    /// Receiver that observes connection state changes
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.manager.subscribe()
    }

    /// Whether the link is open
    pub fn is_connected(&self) -> bool {
        self.inner.manager.is_open()
    }

    /// Address of the most recent `connect()`
    pub fn url(&self) -> Option<String> {
        self.inner.link.lock().url.clone()
    }

    /// Consecutive failed or dropped connections since the last success
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.manager.attempts()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url())
            .field("state", &self.state())
            .field("handlers", &self.registry().len())
            .finish()
    }
}

/// Resolves once `generation` is no longer the live one
async fn superseded(cancel: &mut watch::Receiver<u64>, generation: u64) {
    loop {
        if *cancel.borrow_and_update() != generation {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn resolve(ready: &mut Option<oneshot::Sender<Result<()>>>, outcome: Result<()>) {
    if let Some(ready) = ready.take() {
        let _ = ready.send(outcome);
    }
}

/// Owns the socket for one generation, reconnecting until told to stop
async fn run_connection(
    inner: Arc<Inner>,
    generation: u64,
    url: String,
    ready: oneshot::Sender<Result<()>>,
) {
    let mut ready = Some(ready);
    let mut cancel = inner.generation.subscribe();

    loop {
        let attempt = tokio::select! {
            attempt = connect_async(url.as_str()) => attempt,
            _ = superseded(&mut cancel, generation) => {
                tracing::debug!(generation, "Connection attempt superseded");
                resolve(&mut ready, Err(Error::Cancelled));
                return;
            }
        };

        // Leave Open/Connecting before handlers hear about the failure
        let next_delay = match attempt {
            Ok((ws_stream, _)) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let reconnected = ready.is_none();

                let opened = inner.with_current(generation, |link| {
                    link.outbound = Some(tx);
                    link.pending = None;
                    inner.manager.opened();
                });
                if opened.is_none() {
                    resolve(&mut ready, Err(Error::Cancelled));
                    return;
                }

                inner.report_state();
                if reconnected {
                    tracing::info!(generation, "Reconnected successfully");
                    if let Some(ref m) = inner.metrics {
                        m.record_reconnection_success();
                    }
                } else {
                    tracing::info!(generation, "Connected successfully");
                }

                resolve(&mut ready, Ok(()));
                inner.dispatcher.emit(&Event::Connected);

                let Some(reason) = pump(&inner, ws_stream, rx, &mut cancel, generation).await
                else {
                    return;
                };

                let Some(next_delay) = inner.with_current(generation, |link| {
                    link.outbound = None;
                    inner.manager.next_reconnect_delay()
                }) else {
                    return;
                };
                inner.report_state();

                tracing::info!(generation, reason = %reason, "Connection lost");
                inner.dispatcher.emit(&Event::Disconnected { reason });
                next_delay
            }
            Err(e) => {
                let error = Error::WebSocket(e.to_string());

                let Some(next_delay) = inner.with_current(generation, |link| {
                    link.pending = None;
                    inner.manager.next_reconnect_delay()
                }) else {
                    resolve(&mut ready, Err(Error::Cancelled));
                    return;
                };
                inner.report_state();

                tracing::warn!(generation, error = %error, "Connection attempt failed");
                if let Some(ref m) = inner.metrics {
                    m.record_error("connect");
                }

                resolve(&mut ready, Err(error.clone()));
                inner.dispatcher.emit(&Event::Error(error));
                next_delay
            }
        };

        let Some(delay) = next_delay else {
            tracing::error!(generation, url = %url, "reconnect attempts exhausted");
            return;
        };

        if let Some(ref m) = inner.metrics {
            m.record_reconnection_attempt();
        }
        tracing::info!(
            generation,
            attempt = inner.manager.attempts(),
            delay_ms = delay.as_millis() as u64,
            "Reconnecting"
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = superseded(&mut cancel, generation) => return,
        }

        if inner
            .with_current(generation, |_| inner.manager.connecting())
            .is_none()
        {
            return;
        }
        inner.report_state();
    }
}

/// Shuttle frames until the channel closes
///
/// Returns `None` when the generation was superseded, after sending a close
/// frame to the peer.
async fn pump(
    inner: &Inner,
    ws_stream: WsStream,
    mut outbound: mpsc::UnboundedReceiver<WsMessage>,
    cancel: &mut watch::Receiver<u64>,
    generation: u64,
) -> Option<CloseReason> {
    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    inner.dispatcher.handle_frame(&text);
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (Some(u16::from(f.code)), f.reason.into_owned()))
                        .unwrap_or((None, String::new()));
                    return Some(CloseReason::Remote { code, reason });
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    tracing::debug!(len = data.len(), "Ignoring binary frame");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!(error = %e, "WebSocket error");
                    if let Some(ref m) = inner.metrics {
                        m.record_error("websocket");
                    }
                    return Some(CloseReason::Error(e.to_string()));
                }
                None => {
                    return Some(CloseReason::Remote {
                        code: None,
                        reason: "stream ended".to_string(),
                    });
                }
            },
            Some(message) = outbound.recv() => {
                if let Err(e) = sink.send(message).await {
                    tracing::error!(error = %e, "Failed to write frame");
                    if let Some(ref m) = inner.metrics {
                        m.record_error("write");
                    }
                    return Some(CloseReason::Error(e.to_string()));
                }
            }
            _ = superseded(cancel, generation) => {
                let _ = sink.send(WsMessage::Close(None)).await;
                let _ = sink.close().await;
                return None;
            }
        }
    }
}
