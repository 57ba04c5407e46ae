//! WebSocket transport built on tokio-tungstenite.
//!
//! Maps the WebSocket message stream onto [`TransportEvent`]s:
//!
//! | WebSocket                      | Event                                  |
//! |--------------------------------|----------------------------------------|
//! | `Text` / `Binary`              | `Frame(bytes)`                         |
//! | `Ping` / `Pong` / raw `Frame`  | none (pongs are sent by tungstenite)   |
//! | `Close(frame)`                 | `Closed { code, reason }`              |
//! | stream error                   | `Error(..)` then `Closed { 1006 }`     |
//! | stream ended without `Close`   | `Closed { 1006 }`                      |
//!
//! Both `ws://` and `wss://` URLs are accepted; TLS uses rustls with the
//! webpki root store.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        protocol::{frame::coding::CloseCode, CloseFrame},
        Error as WsError, Message as WsMessage,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, trace};

use crate::application::transport::{
    close_code, ConnectError, Connection, Transport, TransportEvent,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default limit for the TCP + TLS + upgrade handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to keep reading after a close frame so the handshake completes.
const CLOSE_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Opens WebSocket connections to the print server.
#[derive(Debug, Clone)]
pub struct WsTransport {
    connect_timeout: Duration,
}

impl WsTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl Transport for WsTransport {
    type Conn = WsConnection;

    async fn open(&self, url: &str) -> Result<WsConnection, ConnectError> {
        let (stream, response) = tokio::time::timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| {
                ConnectError::Failed(format!(
                    "handshake timed out after {}s",
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(map_connect_error)?;

        debug!(status = %response.status(), "websocket upgrade accepted");
        Ok(WsConnection::new(stream))
    }
}

fn map_connect_error(err: WsError) -> ConnectError {
    match err {
        WsError::Url(e) => ConnectError::InvalidUrl(e.to_string()),
        other => ConnectError::Failed(other.to_string()),
    }
}

/// One open WebSocket connection.
pub struct WsConnection {
    stream: WsStream,
    pending: Option<TransportEvent>,
    finished: bool,
}

impl WsConnection {
    fn new(stream: WsStream) -> Self {
        Self {
            stream,
            pending: None,
            finished: false,
        }
    }

    /// Keeps polling after a close frame so tungstenite can flush its reply.
    async fn drain(&mut self) {
        let drain = async {
            while let Some(msg) = self.stream.next().await {
                if msg.is_err() {
                    break;
                }
            }
        };
        if tokio::time::timeout(CLOSE_DRAIN_TIMEOUT, drain).await.is_err() {
            debug!("peer did not finish the close handshake");
        }
    }

    fn abnormal(reason: &str) -> TransportEvent {
        TransportEvent::Closed {
            code: Some(close_code::ABNORMAL),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn next_event(&mut self) -> TransportEvent {
        if let Some(event) = self.pending.take() {
            return event;
        }
        if self.finished {
            return Self::abnormal("connection already closed");
        }

        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return TransportEvent::Frame(text.into_bytes()),
                Some(Ok(WsMessage::Binary(data))) => return TransportEvent::Frame(data),
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                    trace!("control frame");
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(CloseFrame { code, reason }) => {
                            (Some(u16::from(code)), reason.into_owned())
                        }
                        None => (None, String::new()),
                    };
                    self.drain().await;
                    self.finished = true;
                    return TransportEvent::Closed { code, reason };
                }
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    self.finished = true;
                    return Self::abnormal("connection dropped");
                }
                Some(Err(e)) => {
                    self.finished = true;
                    self.pending = Some(Self::abnormal(""));
                    return TransportEvent::Error(e.to_string());
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.finished {
            return;
        }
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "agent shutting down".into(),
        };
        if let Err(e) = self.stream.close(Some(frame)).await {
            debug!(error = %e, "close frame not sent");
        }
        self.drain().await;
        self.finished = true;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
