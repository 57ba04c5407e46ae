//! ConnectionSession: the per-connection state machine.
//!
//! A session owns no I/O.  The supervisor's drive loop pulls events from the
//! transport and calls exactly one transition method per event:
//!
//! | Event                   | Method          | Effect                                   |
//! |-------------------------|-----------------|------------------------------------------|
//! | handshake completed     | `on_open`       | `Connecting → Open`                      |
//! | `TransportEvent::Frame` | `on_frame`      | decode, then print if a job was produced |
//! | `TransportEvent::Error` | `on_error`      | record error, `→ ClosedError`            |
//! | `TransportEvent::Closed`| `on_close`      | `→ ClosedNormal` or `ClosedError`        |
//! | operator shutdown       | `begin_close`   | `Open → Closing`                         |
//!
//! `on_frame` awaits the printer before returning, and the drive loop does not
//! read the next event until it returns, so at most one job is ever in flight
//! and jobs print in arrival order.
//!
//! # Failure isolation
//!
//! Neither a malformed frame nor a printer failure changes the session state.
//! Both are logged and counted, and the session keeps accepting frames.  A
//! panic inside a device adapter is caught at this boundary too.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use relay_core::{JobDecoder, MalformedJobError, SessionState};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::sink::{DeviceError, DeviceSink};
use crate::application::transport::{close_code, TransportEvent};

/// What happened to one inbound frame.
#[derive(Debug)]
pub enum FrameOutcome {
    /// A job was decoded and the printer accepted it.
    Printed { bytes: usize },
    /// The envelope carried no payload; nothing was sent to the printer.
    Ignored,
    /// The frame could not be decoded and was dropped.
    Malformed(MalformedJobError),
    /// The printer rejected the job; the job was dropped.
    DeviceFailed(DeviceError),
    /// The device adapter panicked; the job was dropped.
    DevicePanicked,
    /// The frame arrived while the session was not open.
    Rejected,
}

/// Per-session counters, logged when the session ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub printed: u64,
    pub ignored: u64,
    pub malformed: u64,
    pub device_failures: u64,
}

/// State machine for one connection lifetime.
pub struct ConnectionSession {
    id: Uuid,
    state: SessionState,
    decoder: JobDecoder,
    sink: Arc<dyn DeviceSink>,
    settle_delay: Duration,
    last_error: Option<String>,
    close_info: Option<(Option<u16>, String)>,
    stats: SessionStats,
}

impl ConnectionSession {
    /// Creates a session in the `Connecting` state.
    ///
    /// `settle_delay` is waited after every successful print before the next
    /// frame is read; slow printers drop bytes if jobs arrive back to back.
    pub fn new(sink: Arc<dyn DeviceSink>, settle_delay: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Connecting,
            decoder: JobDecoder::new(),
            sink,
            settle_delay,
            last_error: None,
            close_info: None,
            stats: SessionStats::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The connection is established.
    pub fn on_open(&mut self) {
        if self.state != SessionState::Connecting {
            warn!(state = %self.state, "on_open ignored outside connecting state");
            return;
        }
        self.state = SessionState::Open;
        info!(session = %self.id, device = %self.sink.describe(), "connected");
    }

    /// Handles one inbound frame: decode, then print.
    pub async fn on_frame(&mut self, raw: &[u8]) -> FrameOutcome {
        if !self.state.accepts_frames() {
            debug!(state = %self.state, "frame dropped; session not open");
            return FrameOutcome::Rejected;
        }
        self.stats.frames += 1;
        info!(bytes = raw.len(), "job received");

        let job = match self.decoder.decode(raw) {
            Ok(Some(job)) => job,
            Ok(None) => {
                self.stats.ignored += 1;
                return FrameOutcome::Ignored;
            }
            Err(e) => {
                self.stats.malformed += 1;
                error!(error = %e, "dropping malformed job");
                return FrameOutcome::Malformed(e);
            }
        };
        info!(bytes = job.len(), "job decoded");

        let send = AssertUnwindSafe(self.sink.send(job.command_bytes())).catch_unwind();
        match send.await {
            Ok(Ok(())) => {
                self.stats.printed += 1;
                info!(bytes = job.len(), "print succeeded");
                if !self.settle_delay.is_zero() {
                    tokio::time::sleep(self.settle_delay).await;
                }
                FrameOutcome::Printed { bytes: job.len() }
            }
            Ok(Err(e)) => {
                self.stats.device_failures += 1;
                error!(error = %e, "print failed; job dropped");
                FrameOutcome::DeviceFailed(e)
            }
            Err(_) => {
                self.stats.device_failures += 1;
                error!("print failed: device adapter panicked; job dropped");
                FrameOutcome::DevicePanicked
            }
        }
    }

    /// The transport reported an error.
    pub fn on_error(&mut self, err: impl Into<String>) {
        let err = err.into();
        warn!(error = %err, "connection error");
        self.last_error = Some(err);
        self.state = SessionState::ClosedError;
    }

    /// The connection closed.
    ///
    /// A recorded error always wins.  Otherwise a close the agent asked for,
    /// codes 1000/1001, and a close frame without a code count as normal.
    pub fn on_close(&mut self, code: Option<u16>, reason: &str) {
        self.close_info = Some((code, reason.to_string()));

        let normal = self.last_error.is_none()
            && (self.state == SessionState::Closing
                || matches!(code, None | Some(close_code::NORMAL) | Some(close_code::GOING_AWAY)));

        self.state = if normal {
            SessionState::ClosedNormal
        } else {
            SessionState::ClosedError
        };
        debug!(?code, reason, state = %self.state, "close handled");
    }

    /// The agent is shutting down and will close the connection.
    pub fn begin_close(&mut self) {
        if self.state == SessionState::Open {
            self.state = SessionState::Closing;
        }
    }

    /// Dispatches one transport event to the matching transition.
    pub async fn handle(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Frame(raw) => {
                self.on_frame(&raw).await;
            }
            TransportEvent::Error(err) => self.on_error(err),
            TransportEvent::Closed { code, reason } => self.on_close(code, &reason),
        }
    }

    /// Human-readable reason the session ended, for the `disconnected` log.
    pub fn end_reason(&self) -> String {
        match (&self.last_error, &self.close_info) {
            (Some(err), _) => err.clone(),
            (None, Some((Some(code), reason))) if reason.is_empty() => format!("code {code}"),
            (None, Some((Some(code), reason))) => format!("code {code}: {reason}"),
            (None, Some((None, reason))) if reason.is_empty() => "closed by server".to_string(),
            (None, Some((None, reason))) => reason.clone(),
            (None, None) => "unknown".to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sink::MockDeviceSink;

    fn open_session(sink: MockDeviceSink) -> ConnectionSession {
        let mut session = ConnectionSession::new(Arc::new(sink), Duration::ZERO);
        session.on_open();
        session
    }

    fn idle_sink() -> MockDeviceSink {
        let mut sink = MockDeviceSink::new();
        sink.expect_describe().return_const("mock".to_string());
        sink
    }

    #[test]
    fn test_new_session_starts_connecting() {
        let session = ConnectionSession::new(Arc::new(idle_sink()), Duration::ZERO);
        assert_eq!(session.state(), SessionState::Connecting);
    }

    #[test]
    fn test_on_open_moves_to_open() {
        let session = open_session(idle_sink());
        assert_eq!(session.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn test_valid_frame_is_sent_once_with_decoded_bytes() {
        // Arrange
        let mut sink = idle_sink();
        sink.expect_send()
            .withf(|bytes| bytes.to_vec() == vec![0x1B, 0x19, 0x22, 0xC0, 0x31])
            .times(1)
            .returning(|_| Ok(()));
        let mut session = open_session(sink);

        // Act
        let outcome = session.on_frame(br#"{"escpos":"GxkiwDE="}"#).await;

        // Assert
        assert!(matches!(outcome, FrameOutcome::Printed { bytes: 5 }));
        assert_eq!(session.stats().printed, 1);
    }

    #[tokio::test]
    async fn test_frame_without_payload_never_reaches_sink() {
        let mut sink = idle_sink();
        sink.expect_send().times(0);
        let mut session = open_session(sink);

        let outcome = session.on_frame(br#"{"foo":"bar"}"#).await;

        assert!(matches!(outcome, FrameOutcome::Ignored));
        assert_eq!(session.stats().ignored, 1);
    }

    #[tokio::test]
    async fn test_invalid_base64_never_reaches_sink() {
        let mut sink = idle_sink();
        sink.expect_send().times(0);
        let mut session = open_session(sink);

        let outcome = session.on_frame(br#"{"escpos":"%%%"}"#).await;

        assert!(matches!(outcome, FrameOutcome::Malformed(_)));
        assert_eq!(session.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn test_device_failure_keeps_session_open() {
        // Arrange: first send fails, second succeeds
        let mut sink = idle_sink();
        let mut seq = mockall::Sequence::new();
        sink.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(DeviceError::Timeout { stage: "writing" }));
        sink.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let mut session = open_session(sink);

        // Act
        let first = session.on_frame(br#"{"escpos":"G0A="}"#).await;
        let second = session.on_frame(br#"{"escpos":"G0A="}"#).await;

        // Assert
        assert!(matches!(first, FrameOutcome::DeviceFailed(_)));
        assert!(matches!(second, FrameOutcome::Printed { .. }));
        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(session.stats().device_failures, 1);
        assert_eq!(session.stats().printed, 1);
    }

    #[tokio::test]
    async fn test_frames_before_open_are_rejected() {
        let mut sink = idle_sink();
        sink.expect_send().times(0);
        let mut session = ConnectionSession::new(Arc::new(sink), Duration::ZERO);

        let outcome = session.on_frame(br#"{"escpos":"G0A="}"#).await;

        assert!(matches!(outcome, FrameOutcome::Rejected));
        assert_eq!(session.stats().frames, 0);
    }

    #[test]
    fn test_error_then_abnormal_close_is_closed_error() {
        // Arrange
        let mut session = open_session(idle_sink());

        // Act
        session.on_error("connection reset by peer");
        session.on_close(Some(close_code::ABNORMAL), "");

        // Assert
        assert_eq!(session.state(), SessionState::ClosedError);
        assert_eq!(session.end_reason(), "connection reset by peer");
    }

    #[test]
    fn test_error_then_normal_close_stays_closed_error() {
        let mut session = open_session(idle_sink());
        session.on_error("tls alert");
        session.on_close(Some(close_code::NORMAL), "bye");
        assert_eq!(session.state(), SessionState::ClosedError);
    }

    #[test]
    fn test_normal_close_codes() {
        for code in [Some(1000), Some(1001), None] {
            let mut session = open_session(idle_sink());
            session.on_close(code, "");
            assert_eq!(session.state(), SessionState::ClosedNormal, "code {code:?}");
        }
    }

    #[test]
    fn test_abnormal_close_codes() {
        for code in [1002u16, 1006, 1011, 4001] {
            let mut session = open_session(idle_sink());
            session.on_close(Some(code), "");
            assert_eq!(session.state(), SessionState::ClosedError, "code {code}");
        }
    }

    #[test]
    fn test_agent_initiated_close_is_normal() {
        let mut session = open_session(idle_sink());
        session.begin_close();
        assert_eq!(session.state(), SessionState::Closing);

        session.on_close(Some(close_code::ABNORMAL), "");

        assert_eq!(session.state(), SessionState::ClosedNormal);
    }

    #[test]
    fn test_end_reason_formats_close_code_and_reason() {
        let mut session = open_session(idle_sink());
        session.on_close(Some(4003), "invalid key");
        assert_eq!(session.end_reason(), "code 4003: invalid key");
    }

    #[tokio::test]
    async fn test_handle_dispatches_events() {
        let mut sink = idle_sink();
        sink.expect_send().times(1).returning(|_| Ok(()));
        let mut session = open_session(sink);

        session
            .handle(TransportEvent::Frame(br#"{"escpos":"G0A="}"#.to_vec()))
            .await;
        session
            .handle(TransportEvent::Closed {
                code: Some(1000),
                reason: String::new(),
            })
            .await;

        assert_eq!(session.stats().printed, 1);
        assert_eq!(session.state(), SessionState::ClosedNormal);
    }
}
