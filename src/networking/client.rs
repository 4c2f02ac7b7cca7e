//! WebSocket transport channel
//!
//! One persistent connection to the game server, shared process-wide and
//! reused across views. The channel owns reconnection: an unexpected close
//! is retried on a fixed delay until the connection comes back or the
//! close carried the authentication-rejected code, which is terminal.
//!
//! Inbound frames are parsed into [`ServerMessage`] values and delivered,
//! in arrival order, to the single current subscriber. There is no replay
//! across reconnects; subscribers get a [`TransportEvent::Up`] after every
//! (re)connection and are expected to request a full resync themselves.
//! Attaching a new subscriber detaches the old one, so a session leaving
//! the board view cannot keep receiving another session's events.
//!
//! `send` never throws: it returns `false` while disconnected and the
//! caller surfaces that as a recoverable failure.

use crate::game::session::MoveSink;
use crate::networking::protocol::{ClientMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use http::Uri;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use websocket::{ClientBuilder, MaybeTlsStream, Message, WebSocketStream};

/// Close code the server uses to reject a credential; never retried
pub const AUTH_REJECTED_CLOSE: u16 = 4401;

/// Delay between reconnection attempts
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Errors from the transport channel
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint/credential pair does not form a valid URI
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    /// Closed on purpose (or auth-rejected); retry suppressed
    Closed,
}

/// Typed events delivered to the current subscriber
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Link (re)established; the subscriber should request a resync
    Up,
    /// Link lost unexpectedly; reconnection is underway
    Down,
    /// The server rejected the credential; no retry, re-login required
    AuthRejected,
    /// A parsed inbound message
    Message(ServerMessage),
}

#[derive(PartialEq, Eq, Clone)]
struct Target {
    endpoint: String,
    credential: String,
}

struct Inner {
    target: Mutex<Option<Target>>,
    link: Mutex<LinkState>,
    outbound: Mutex<Option<UnboundedSender<String>>>,
    subscriber: Mutex<Option<UnboundedSender<TransportEvent>>>,
    /// Bumped on every connect/close; tasks carrying a stale value stop
    generation: AtomicU64,
    reconnect_delay: Duration,
}

impl Inner {
    fn set_link(&self, state: LinkState) {
        *self.link.lock().unwrap() = state;
    }

    fn notify(&self, event: TransportEvent) {
        if let Some(tx) = self.subscriber.lock().unwrap().as_ref() {
            // A dropped receiver just means nobody is listening right now
            let _ = tx.send(event);
        }
    }
}

/// The shared WebSocket channel
#[derive(Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY)
    }
}

impl Transport {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                target: Mutex::new(None),
                link: Mutex::new(LinkState::Disconnected),
                outbound: Mutex::new(None),
                subscriber: Mutex::new(None),
                generation: AtomicU64::new(0),
                reconnect_delay,
            }),
        }
    }

    /// Current connection state
    pub fn state(&self) -> LinkState {
        *self.inner.link.lock().unwrap()
    }

    /// Connect (or reconnect) to the server
    ///
    /// Idempotent: connecting again with the identical endpoint and
    /// credential while the link is up is a no-op. Switching either value
    /// tears the old connection down first.
    pub fn connect(&self, endpoint: &str, credential: &str) -> Result<(), TransportError> {
        let target = Target {
            endpoint: endpoint.to_string(),
            credential: credential.to_string(),
        };

        {
            let current = self.inner.target.lock().unwrap();
            let link = *self.inner.link.lock().unwrap();
            if current.as_ref() == Some(&target)
                && matches!(link, LinkState::Connecting | LinkState::Connected)
            {
                debug!("[NETWORK] already connected to {endpoint}, ignoring");
                return Ok(());
            }
        }

        let uri: Uri = format!("{endpoint}?token={credential}")
            .parse()
            .map_err(|_| TransportError::InvalidEndpoint(endpoint.to_string()))?;

        // Invalidate whatever task is running for the previous target
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.target.lock().unwrap() = Some(target);
        *self.inner.outbound.lock().unwrap() = None;
        self.inner.set_link(LinkState::Connecting);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            run_link(inner, uri, generation).await;
        });
        Ok(())
    }

    /// Close the channel on purpose; suppresses reconnection
    pub fn close(&self) {
        info!("[NETWORK] closing connection");
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.set_link(LinkState::Closed);
        // Dropping the outbound sender unblocks the pump, which then sends
        // a close frame and exits
        *self.inner.outbound.lock().unwrap() = None;
    }

    /// Send one message; `false` when not currently connected
    pub fn send(&self, msg: &ClientMessage) -> bool {
        if self.state() != LinkState::Connected {
            return false;
        }
        let text = match serde_json::to_string(msg) {
            Ok(text) => text,
            Err(e) => {
                warn!("[NETWORK] failed to encode outbound message: {e}");
                return false;
            }
        };
        match self.inner.outbound.lock().unwrap().as_ref() {
            Some(tx) => tx.send(text).is_ok(),
            None => false,
        }
    }

    /// Attach as the channel's subscriber, detaching any previous one
    ///
    /// Exactly one game session listens at a time; switching views must
    /// re-subscribe so stale sessions stop receiving events.
    pub fn subscribe(&self) -> UnboundedReceiver<TransportEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inner.subscriber.lock().unwrap() = Some(tx);
        rx
    }

    /// Detach the current subscriber without closing the connection
    pub fn unsubscribe(&self) {
        *self.inner.subscriber.lock().unwrap() = None;
    }
}

/// Connect-pump-retry loop for one target
async fn run_link(inner: Arc<Inner>, uri: Uri, generation: u64) {
    loop {
        if inner.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        debug!("[NETWORK] connecting to {uri}");
        match ClientBuilder::from_uri(uri.clone()).connect().await {
            Ok((stream, _response)) => {
                if inner.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
                info!("[NETWORK] connected");
                let (out_tx, out_rx) = mpsc::unbounded_channel();
                *inner.outbound.lock().unwrap() = Some(out_tx);
                inner.set_link(LinkState::Connected);
                inner.notify(TransportEvent::Up);

                let auth_rejected = pump(&inner, stream, out_rx).await;

                *inner.outbound.lock().unwrap() = None;
                if inner.generation.load(Ordering::SeqCst) != generation {
                    // Torn down on purpose; state already reflects it
                    return;
                }
                if auth_rejected {
                    warn!("[NETWORK] authentication rejected, not retrying");
                    inner.set_link(LinkState::Closed);
                    inner.notify(TransportEvent::AuthRejected);
                    return;
                }
                warn!(
                    "[NETWORK] connection lost, retrying in {:?}",
                    inner.reconnect_delay
                );
                inner.set_link(LinkState::Disconnected);
                inner.notify(TransportEvent::Down);
            }
            Err(e) => {
                if inner.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
                warn!("[NETWORK] connect failed: {e}");
                inner.set_link(LinkState::Disconnected);
            }
        }
        tokio::time::sleep(inner.reconnect_delay).await;
    }
}

/// Drive one live connection; returns whether the close was an auth reject
async fn pump(
    inner: &Arc<Inner>,
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    mut out_rx: UnboundedReceiver<String>,
) -> bool {
    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            outbound = out_rx.recv() => match outbound {
                Some(text) => {
                    if let Err(e) = sink.send(Message::text(text)).await {
                        warn!("[NETWORK] send failed: {e}");
                        return false;
                    }
                }
                None => {
                    // Intentional close
                    let _ = sink.send(Message::close(None, "")).await;
                    return false;
                }
            },
            inbound = source.next() => match inbound {
                Some(Ok(msg)) => {
                    if let Some((code, reason)) = msg.as_close() {
                        if u16::from(code) == AUTH_REJECTED_CLOSE {
                            return true;
                        }
                        info!("[NETWORK] server closed connection: {reason}");
                        return false;
                    }
                    if let Some(text) = msg.as_text() {
                        match serde_json::from_str::<ServerMessage>(text) {
                            Ok(parsed) => inner.notify(TransportEvent::Message(parsed)),
                            Err(e) => {
                                warn!("[NETWORK] dropping malformed message: {e}");
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!("[NETWORK] socket error: {e}");
                    return false;
                }
                None => return false,
            },
        }
    }
}

/// Move sink backed by the live transport
pub struct TransportSink {
    transport: Transport,
}

impl TransportSink {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

impl MoveSink for TransportSink {
    fn dispatch(&mut self, msg: ClientMessage) -> bool {
        self.transport.send(&msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_while_disconnected_returns_false() {
        let transport = Transport::default();
        assert_eq!(transport.state(), LinkState::Disconnected);
        assert!(!transport.send(&ClientMessage::CancelMatch));
    }

    #[test]
    fn test_resubscribe_detaches_previous_subscriber() {
        let transport = Transport::default();
        let mut first = transport.subscribe();
        let _second = transport.subscribe();

        // The first receiver's sender was replaced and dropped
        match first.try_recv() {
            Err(tokio::sync::mpsc::error::TryRecvError::Disconnected) => {}
            other => panic!("first subscriber should be detached, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_rejects_unparsable_endpoint() {
        let transport = Transport::default();
        let result = transport.connect("not a uri", "token");
        assert!(matches!(result, Err(TransportError::InvalidEndpoint(_))));
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_for_same_target() {
        let transport = Transport::new(Duration::from_millis(50));
        transport.connect("ws://127.0.0.1:1/ws", "tok").unwrap();
        // Same target again while connecting: accepted, no teardown
        transport.connect("ws://127.0.0.1:1/ws", "tok").unwrap();
        transport.close();
        assert_eq!(transport.state(), LinkState::Closed);
        assert!(!transport.send(&ClientMessage::CancelMatch));
    }
}
