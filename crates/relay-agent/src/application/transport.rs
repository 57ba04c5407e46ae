//! Transport port: the event-loop adapter seam between the supervisor and the
//! network.
//!
//! A [`Transport`] opens connections; a [`Connection`] yields one
//! [`TransportEvent`] at a time.  The supervisor pulls events in a loop and
//! feeds each one to the session before pulling the next, which is what
//! keeps frame processing strictly sequential.
//!
//! # Event contract
//!
//! - Zero or more `Frame`s, possibly followed by one `Error`.
//! - Exactly one `Closed` as the final event, even after an `Error`.
//! - `next_event` must be cancel-safe: the supervisor may drop the future
//!   when a shutdown arrives while the connection is idle.

use async_trait::async_trait;
use thiserror::Error;

/// WebSocket close codes the session distinguishes.
pub mod close_code {
    /// Clean close.
    pub const NORMAL: u16 = 1000;
    /// The peer is going away (server restart, agent shutdown).
    pub const GOING_AWAY: u16 = 1001;
    /// The connection dropped without a close handshake.
    pub const ABNORMAL: u16 = 1006;
}

/// The transport could not establish a session.
///
/// Never fatal: the supervisor waits and tries again.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The connection URL was rejected before any network I/O.
    #[error("invalid connection URL: {0}")]
    InvalidUrl(String),

    /// DNS, TCP, TLS, or handshake failure.
    #[error("transport could not be established: {0}")]
    Failed(String),
}

/// One thing that happened on an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A complete inbound message.  Text frames arrive as their UTF-8 bytes.
    Frame(Vec<u8>),
    /// The connection failed; a `Closed` event follows.
    Error(String),
    /// The connection is over.  `code` is `None` when the peer sent a close
    /// frame without a status code.
    Closed { code: Option<u16>, reason: String },
}

/// A live connection that produces events until it is closed.
#[async_trait]
pub trait Connection: Send {
    /// Waits for the next event.
    async fn next_event(&mut self) -> TransportEvent;

    /// Starts a clean close handshake and waits for it to finish.
    async fn close(&mut self);
}

/// Opens connections to the print server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The connection type produced by [`Transport::open`].
    type Conn: Connection;

    /// Establishes a connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] if the session cannot be established.
    async fn open(&self, url: &str) -> Result<Self::Conn, ConnectError>;
}
