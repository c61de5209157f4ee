//! Common test utilities for clueline-client integration tests
//!
//! Mock servers and helpers for exercising the client against real sockets
//! on 127.0.0.1 without a game server.

#![allow(dead_code)]

use clueline_client::Handler;
use clueline_core::Event;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Mock WebSocket server for client testing
///
/// Records every text frame it receives, can push frames to every
/// connected client, and counts accepted connections.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    push_tx: broadcast::Sender<Message>,
    message_rx: mpsc::Receiver<String>,
    connections: Arc<AtomicUsize>,
}

impl MockWsServer {
    /// Start a server that only records what it receives
    pub async fn new() -> Self {
        Self::with_handler(|_| None).await
    }

    /// Start a server that answers each text frame with `handler`'s reply
    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(String) -> Option<String> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::serve(listener, Arc::new(handler))
    }

    /// Start a recording server on a specific address
    pub async fn bind(addr: SocketAddr) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        Self::serve(listener, Arc::new(|_: String| None::<String>))
    }

    fn serve(
        listener: TcpListener,
        handler: Arc<dyn Fn(String) -> Option<String> + Send + Sync>,
    ) -> Self {
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (msg_tx, msg_rx) = mpsc::channel::<String>(100);
        let (push_tx, _) = broadcast::channel::<Message>(100);
        let connections = Arc::new(AtomicUsize::new(0));

        let push = push_tx.clone();
        let accepted = Arc::clone(&connections);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accept_result = listener.accept() => {
                        let Ok((stream, _)) = accept_result else { continue };
                        accepted.fetch_add(1, Ordering::SeqCst);

                        let mut push_rx = push.subscribe();
                        let msg_tx = msg_tx.clone();
                        let handler = Arc::clone(&handler);

                        tokio::spawn(async move {
                            let Ok(ws_stream) = accept_async(stream).await else { return };
                            let (mut write, mut read) = ws_stream.split();

                            loop {
                                tokio::select! {
                                    frame = read.next() => match frame {
                                        Some(Ok(Message::Text(text))) => {
                                            let _ = msg_tx.send(text.clone()).await;
                                            if let Some(reply) = handler(text) {
                                                let _ = write.send(Message::Text(reply)).await;
                                            }
                                        }
                                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                                        Some(Ok(_)) => {}
                                    },
                                    pushed = push_rx.recv() => match pushed {
                                        Ok(Message::Close(frame)) => {
                                            let _ = write.send(Message::Close(frame)).await;
                                            break;
                                        }
                                        Ok(message) => {
                                            let _ = write.send(message).await;
                                        }
                                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                                        Err(broadcast::error::RecvError::Closed) => break,
                                    },
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            push_tx,
            message_rx: msg_rx,
            connections,
        }
    }

    /// WebSocket URL for connecting to this server
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of TCP connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Send a text frame to every connected client
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.push_tx.send(Message::Text(text.into()));
    }

    /// Send a binary frame to every connected client
    pub fn push_binary(&self, data: Vec<u8>) {
        let _ = self.push_tx.send(Message::Binary(data));
    }

    /// Close every connection with a normal close frame
    pub fn close_all(&self) {
        let _ = self.push_tx.send(Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "server closing".into(),
        })));
    }

    /// Next text frame the server received, or `None` after `TIMEOUT`
    pub async fn wait_for_message(&mut self) -> Option<String> {
        self.wait_for_message_within(TIMEOUT).await
    }

    pub async fn wait_for_message_within(&mut self, within: Duration) -> Option<String> {
        tokio::time::timeout(within, self.message_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Stop accepting and close every open connection
    pub async fn shutdown(self) {
        self.close_all();
        let _ = self.shutdown_tx.send(()).await;
        // Give the accept loop time to drop the listener
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Server that accepts TCP connections but never answers the handshake
pub struct StalledServer {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
}

impl StalledServer {
    pub async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));

        let accepted = Arc::clone(&connections);
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                held.push(stream);
            }
        });

        Self { addr, connections }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// URL of a local port nothing is listening on
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}", addr)
}

/// Handler that forwards every event it sees into a channel
pub fn event_channel() -> (Handler, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = Handler::new(move |event| {
        let _ = tx.send(event.clone());
    });
    (handler, rx)
}

/// Next event from `rx`, or `None` after `TIMEOUT`
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Option<Event> {
    tokio::time::timeout(TIMEOUT, rx.recv()).await.ok().flatten()
}

/// Whether `rx` stays empty for `within`
pub async fn stays_quiet(rx: &mut mpsc::UnboundedReceiver<Event>, within: Duration) -> bool {
    tokio::time::timeout(within, rx.recv()).await.is_err()
}

/// Wait until the watched value satisfies `pred`
pub async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, pred: F) -> bool
where
    F: FnMut(&T) -> bool,
{
    matches!(tokio::time::timeout(TIMEOUT, rx.wait_for(pred)).await, Ok(Ok(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_creation() {
        let server = MockWsServer::new().await;
        assert!(server.url().starts_with("ws://127.0.0.1:"));
        assert_eq!(server.connection_count(), 0);
        server.shutdown().await;
    }
}
