//! Websocket transport with transport-owned reconnection.
//!
//! DESIGN
//! ======
//! [`Connector`] is the seam between the registry and the network: it
//! performs one handshake and hands back a send handle plus a stream of
//! [`TransportEvent`]s. The production [`WsConnector`] spawns an owner task
//! per connection that pumps inbound text frames and, on connection loss,
//! retries with a fixed backoff sequence, announcing `Reconnecting` /
//! `Reconnected` so the registry can track lifecycle state. Tests inject
//! their own connector instead of opening sockets.
//!
//! ERROR HANDLING
//! ==============
//! Only the initial handshake fails the caller. Later losses are absorbed
//! by the retry loop; a server-initiated close is terminal and surfaces as
//! [`TransportEvent::Closed`]. Nothing is buffered while the socket is
//! down: outbound sends in that window are dropped with a warning.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

/// Fixed reconnect backoff sequence; after the last entry the final
/// interval repeats forever.
const RECONNECT_DELAYS_MS: [u64; 6] = [0, 0, 1_000, 2_000, 5_000, 10_000];

/// Supplies the current bearer token, invoked once per handshake so a
/// refreshed token is picked up on reconnect without re-registering.
pub type TokenProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The websocket handshake failed.
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    /// The transport's owner task is gone; the connection no longer exists.
    #[error("transport is not open")]
    NotOpen,
}

/// Lifecycle and traffic events emitted by a live transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// One inbound text frame.
    Message(String),
    /// Connection lost; the transport is retrying.
    Reconnecting,
    /// A retry succeeded; traffic flows again.
    Reconnected,
    /// Terminal close; the transport will emit nothing further.
    Closed,
}

/// Send-side handle for one live connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotOpen`] when the connection is gone.
    async fn send(&self, text: String) -> Result<(), TransportError>;

    /// Close the connection from this side. Idempotent.
    async fn close(&self);
}

/// Builds live transports. The seam tests mock.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Perform one handshake against `url`, authenticating with the token
    /// the provider currently yields.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] when the handshake fails; no
    /// task is spawned and nothing is retained in that case.
    async fn connect(
        &self,
        url: &str,
        token: TokenProvider,
    ) -> Result<(Arc<dyn Transport>, mpsc::UnboundedReceiver<TransportEvent>), TransportError>;
}

/// Backoff delay for the given zero-based retry attempt.
#[must_use]
pub fn reconnect_delay(attempt: usize) -> Duration {
    let ms = RECONNECT_DELAYS_MS
        .get(attempt)
        .copied()
        .unwrap_or(RECONNECT_DELAYS_MS[RECONNECT_DELAYS_MS.len() - 1]);
    Duration::from_millis(ms)
}

/// Append the bearer token as an `access_token` query parameter.
fn handshake_url(url: &str, token: Option<&str>) -> String {
    match token {
        Some(token) if url.contains('?') => format!("{url}&access_token={token}"),
        Some(token) => format!("{url}?access_token={token}"),
        None => url.to_owned(),
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production connector over tokio-tungstenite.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(
        &self,
        url: &str,
        token: TokenProvider,
    ) -> Result<(Arc<dyn Transport>, mpsc::UnboundedReceiver<TransportEvent>), TransportError> {
        let (stream, _) = connect_async(handshake_url(url, token().as_deref()))
            .await
            .map_err(|e| TransportError::Connect(Box::new(e)))?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_transport(stream, url.to_owned(), token, event_tx, out_rx));

        Ok((Arc::new(WsTransport { out_tx }), event_rx))
    }
}

enum Outbound {
    Text(String),
    Close,
}

struct WsTransport {
    out_tx: mpsc::UnboundedSender<Outbound>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&self, text: String) -> Result<(), TransportError> {
        self.out_tx
            .send(Outbound::Text(text))
            .map_err(|_| TransportError::NotOpen)
    }

    async fn close(&self) {
        let _ = self.out_tx.send(Outbound::Close);
    }
}

enum PumpEnd {
    /// This side asked for the close, or every send handle is gone.
    LocalClose,
    /// The server closed the connection; terminal.
    ServerClose,
    /// The connection dropped; eligible for reconnect.
    Lost,
}

/// Owner task for one connection: pump until the stream drops, then retry
/// with the fixed backoff sequence until terminal close or teardown.
async fn run_transport(
    mut stream: WsStream,
    url: String,
    token: TokenProvider,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    loop {
        match pump(&mut stream, &events, &mut outbound).await {
            PumpEnd::LocalClose => {
                let _ = stream.close(None).await;
                return;
            }
            PumpEnd::ServerClose => {
                let _ = events.send(TransportEvent::Closed);
                return;
            }
            PumpEnd::Lost => {
                if events.send(TransportEvent::Reconnecting).is_err() {
                    return;
                }
                match reestablish(&url, &token, &events, &mut outbound).await {
                    Some(next) => {
                        stream = next;
                        if events.send(TransportEvent::Reconnected).is_err() {
                            return;
                        }
                    }
                    None => {
                        let _ = events.send(TransportEvent::Closed);
                        return;
                    }
                }
            }
        }
    }
}

async fn pump(
    stream: &mut WsStream,
    events: &mpsc::UnboundedSender<TransportEvent>,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
) -> PumpEnd {
    loop {
        tokio::select! {
            cmd = outbound.recv() => match cmd {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = stream.send(Message::Text(text.into())).await {
                        warn!(error = %e, "websocket send failed");
                        return PumpEnd::Lost;
                    }
                }
                Some(Outbound::Close) | None => return PumpEnd::LocalClose,
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if events.send(TransportEvent::Message(text.to_string())).is_err() {
                        return PumpEnd::LocalClose;
                    }
                }
                Some(Ok(Message::Close(_))) => return PumpEnd::ServerClose,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "websocket receive error");
                    return PumpEnd::Lost;
                }
                None => return PumpEnd::Lost,
            },
        }
    }
}

/// Retry the handshake until it succeeds or the consumer is gone.
///
/// Returns `None` when the event receiver or the send handle was dropped
/// mid-retry (the connection was torn down while we were reconnecting).
async fn reestablish(
    url: &str,
    token: &TokenProvider,
    events: &mpsc::UnboundedSender<TransportEvent>,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
) -> Option<WsStream> {
    for attempt in 0.. {
        // Sends are not buffered across the gap.
        loop {
            match outbound.try_recv() {
                Ok(Outbound::Text(_)) => debug!("dropping outbound frame while disconnected"),
                Ok(Outbound::Close) => return None,
                Err(_) => break,
            }
        }
        if events.is_closed() {
            return None;
        }

        tokio::time::sleep(reconnect_delay(attempt)).await;
        match connect_async(handshake_url(url, token().as_deref())).await {
            Ok((stream, _)) => return Some(stream),
            Err(e) => warn!(error = %e, attempt, "websocket reconnect failed"),
        }
    }
    None
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
