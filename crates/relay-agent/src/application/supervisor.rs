//! ReconnectSupervisor: keeps the agent connected for the whole process
//! lifetime.
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!   connecting ──open ok──▶ drive session ──terminal──▶ retry scheduled
//!        │                        │                         ▲   (fixed delay)
//!        └──ConnectError──────────┼─────────────────────────┘
//!                                 │
//!                      shutdown ──┴──▶ Closing ──▶ ClosedNormal ──▶ return
//! ```
//!
//! The loop is iterative and has no attempt limit: an always-on agent expects
//! the server to be unreachable now and then.  The only way out of
//! [`ReconnectSupervisor::run`] is the shutdown signal.
//!
//! Shutdown is observed while waiting for a connection, for the next event,
//! or for the retry delay, but never while a job is being printed.

use std::sync::Arc;
use std::time::Duration;

use relay_core::{Endpoint, SessionState};
use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::application::session::ConnectionSession;
use crate::application::sink::DeviceSink;
use crate::application::transport::{close_code, Connection, Transport, TransportEvent};

/// Default wait between a session ending and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Tunables for the supervisor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Fixed wait before every reconnect attempt.
    pub reconnect_delay: Duration,
    /// Pause after each successful print (passed to every session).
    pub settle_delay: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            settle_delay: Duration::from_millis(500),
        }
    }
}

/// Why [`ReconnectSupervisor::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// The operator asked the agent to stop.
    Shutdown,
}

/// How one session ended, as seen by the supervisor loop.
enum SessionEnd {
    /// Terminal state reached; schedule a retry.
    Terminated(SessionState),
    /// Shutdown requested; leave the loop.
    Shutdown,
}

/// Owns the connect / drive / wait / reconnect loop.
pub struct ReconnectSupervisor<T: Transport> {
    endpoint: Endpoint,
    transport: T,
    sink: Arc<dyn DeviceSink>,
    config: SupervisorConfig,
}

impl<T: Transport> ReconnectSupervisor<T> {
    pub fn new(
        endpoint: Endpoint,
        transport: T,
        sink: Arc<dyn DeviceSink>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            endpoint,
            transport,
            sink,
            config,
        }
    }

    /// Runs until `shutdown` becomes `true`.
    ///
    /// Connection failures, transport errors, and printer errors are all
    /// absorbed here; none of them ends the loop.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> SupervisorExit {
        let url = self.endpoint.connection_url();
        let display_url = self.endpoint.redacted_url();
        let mut attempt: u64 = 0;

        loop {
            if *shutdown.borrow() {
                info!("shutdown requested; supervisor stopping");
                return SupervisorExit::Shutdown;
            }

            attempt += 1;
            info!(attempt, url = %display_url, "connecting");

            let opened = tokio::select! {
                biased;
                _ = shutdown_signalled(&mut shutdown) => {
                    info!("shutdown requested while connecting");
                    return SupervisorExit::Shutdown;
                }
                opened = self.transport.open(&url) => opened,
            };

            let state = match opened {
                Ok(conn) => {
                    let session = ConnectionSession::new(
                        Arc::clone(&self.sink),
                        self.config.settle_delay,
                    );
                    let span = info_span!("session", id = %session.id(), attempt);
                    match drive_session(session, conn, &mut shutdown)
                        .instrument(span)
                        .await
                    {
                        SessionEnd::Terminated(state) => state,
                        SessionEnd::Shutdown => return SupervisorExit::Shutdown,
                    }
                }
                Err(e) => {
                    warn!(attempt, error = %e, "disconnected: connection failed");
                    SessionState::ClosedError
                }
            };

            let delay = self.config.reconnect_delay;
            info!(?state, delay_secs = delay.as_secs_f64(), "retry scheduled");

            tokio::select! {
                biased;
                _ = shutdown_signalled(&mut shutdown) => {
                    info!("shutdown requested during retry delay");
                    return SupervisorExit::Shutdown;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Feeds events from `conn` into `session` until the connection closes.
async fn drive_session<C: Connection>(
    mut session: ConnectionSession,
    mut conn: C,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    session.on_open();

    loop {
        let event = tokio::select! {
            biased;
            _ = shutdown_signalled(shutdown) => {
                session.begin_close();
                conn.close().await;
                session.on_close(Some(close_code::NORMAL), "agent shutting down");
                log_session_end(&session);
                return SessionEnd::Shutdown;
            }
            event = conn.next_event() => event,
        };

        // The frame is fully handled (printed or dropped) before the next
        // event is read.
        let closed = matches!(event, TransportEvent::Closed { .. });
        session.handle(event).await;

        if closed {
            log_session_end(&session);
            return SessionEnd::Terminated(session.state());
        }
    }
}

fn log_session_end(session: &ConnectionSession) {
    let stats = session.stats();
    let reason = session.end_reason();
    match session.state() {
        SessionState::ClosedNormal => info!(
            %reason,
            frames = stats.frames,
            printed = stats.printed,
            ignored = stats.ignored,
            malformed = stats.malformed,
            device_failures = stats.device_failures,
            "disconnected"
        ),
        state => warn!(
            %reason,
            %state,
            frames = stats.frames,
            printed = stats.printed,
            ignored = stats.ignored,
            malformed = stats.malformed,
            device_failures = stats.device_failures,
            "disconnected"
        ),
    }
}

/// Resolves once the shutdown flag is `true`.  Never resolves if the sender
/// is dropped without signalling.
async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            debug!("shutdown sender dropped; running until killed");
            std::future::pending::<()>().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
