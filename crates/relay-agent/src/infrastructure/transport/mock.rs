//! Scripted transport for exercising the supervisor without a network.
//!
//! # Why a scripted transport?
//!
//! The reconnect behaviour depends on what the server does: refuse the
//! connection, send a few jobs and hang up, fail mid-stream, or stay idle.
//! `ScriptedTransport` replays a list of [`ScriptedAttempt`]s, one per call to
//! `open`, and records when each attempt happened so tests can check the
//! retry timing under Tokio's paused clock.
//!
//! # Usage in tests
//!
//! ```ignore
//! let transport = ScriptedTransport::new(vec![
//!     ScriptedAttempt::Refuse("dns failure".into()),
//!     ScriptedAttempt::Accept(vec![TransportEvent::Frame(frame), closed(1000)]),
//! ]);
//! let log = transport.open_log();
//! // ... run the supervisor ...
//! assert_eq!(log.lock().unwrap().len(), 3);
//! ```
//!
//! Once the script is exhausted every further `open` is refused.  An accepted
//! connection whose events run out stays idle until it is closed.

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::application::transport::{ConnectError, Connection, Transport, TransportEvent};

/// What the fake server does on one connection attempt.
#[derive(Debug, Clone)]
pub enum ScriptedAttempt {
    /// The attempt fails before the connection opens.
    Refuse(String),
    /// The attempt succeeds and the connection yields these events in order.
    Accept(Vec<TransportEvent>),
}

/// One recorded call to `open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRecord {
    pub url: String,
    pub at: Instant,
}

/// A transport that follows a fixed script.
pub struct ScriptedTransport {
    attempts: Mutex<VecDeque<ScriptedAttempt>>,
    opens: Arc<Mutex<Vec<OpenRecord>>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new(attempts: Vec<ScriptedAttempt>) -> Self {
        Self {
            attempts: Mutex::new(attempts.into()),
            opens: Arc::new(Mutex::new(Vec::new())),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the list of `open` calls, usable after the transport
    /// has been moved into a supervisor.
    pub fn open_log(&self) -> Arc<Mutex<Vec<OpenRecord>>> {
        Arc::clone(&self.opens)
    }

    /// Shared counter of `Connection::close` calls.
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    type Conn = ScriptedConnection;

    async fn open(&self, url: &str) -> Result<ScriptedConnection, ConnectError> {
        self.opens.lock().unwrap().push(OpenRecord {
            url: url.to_string(),
            at: Instant::now(),
        });

        let next = self.attempts.lock().unwrap().pop_front();
        match next {
            Some(ScriptedAttempt::Accept(events)) => Ok(ScriptedConnection {
                events: events.into(),
                closes: Arc::clone(&self.closes),
            }),
            Some(ScriptedAttempt::Refuse(reason)) => Err(ConnectError::Failed(reason)),
            None => Err(ConnectError::Failed("script exhausted".to_string())),
        }
    }
}

/// Connection produced by [`ScriptedTransport`].
pub struct ScriptedConnection {
    events: VecDeque<TransportEvent>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn next_event(&mut self) -> TransportEvent {
        match self.events.pop_front() {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
