//! Lifecycle states of a single print server connection.
//!
//! ```text
//! Connecting ──on_open──▶ Open ──begin_close──▶ Closing ──on_close──▶ ClosedNormal
//!      │                   │                                      ╲
//!      │ connect failed    ├──on_error─────────────────────────────▶ ClosedError
//!      ▼                   └──on_close(code)──▶ ClosedNormal | ClosedError
//! ClosedError
//! ```
//!
//! The supervisor only cares whether a state is terminal; the distinction
//! between the two closed states is kept for logging.

use std::fmt;

/// Where a connection session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// The transport handshake is in progress.
    Connecting,
    /// Frames are being received and dispatched.
    Open,
    /// The agent has asked the server to close (operator shutdown).
    Closing,
    /// The session ended because of a transport error or abnormal close.
    ClosedError,
    /// The session ended with a clean close handshake.
    ClosedNormal,
}

impl SessionState {
    /// Returns `true` once the session can no longer receive frames.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ClosedError | Self::ClosedNormal)
    }

    /// Returns `true` when inbound frames should be dispatched.
    pub fn accepts_frames(self) -> bool {
        self == Self::Open
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::ClosedError => "closed (error)",
            Self::ClosedNormal => "closed (normal)",
        };
        f.write_str(name)
    }
}
