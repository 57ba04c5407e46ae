//! # relay-core
//!
//! Shared library for the print relay agent containing the domain entities
//! and the inbound job envelope decoder.
//!
//! This crate has zero dependencies on sockets, USB, or async runtimes, so
//! everything in it can be unit-tested with plain `#[test]` functions.
//!
//! # Architecture overview
//!
//! The print relay agent keeps a WebSocket open to a print server.  The
//! server pushes one JSON message per print job; each message carries the
//! raw ESC/POS command bytes for a receipt printer, base64-encoded.  The
//! agent decodes the bytes and writes them verbatim to the printer.
//!
//! - **`domain`** – Connection endpoint, printer target selection, and the
//!   session lifecycle states driven by the agent's reconnect supervisor.
//!
//! - **`protocol`** – The JSON envelope decoder that turns an inbound frame
//!   into zero or one [`PrintJob`], plus the handful of ESC/POS constants the
//!   agent itself emits.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `relay_core::Endpoint` instead of `relay_core::domain::endpoint::Endpoint`.
pub use domain::endpoint::{Endpoint, EndpointError};
pub use domain::session_state::SessionState;
pub use domain::target::{DeviceTarget, DEFAULT_NETWORK_PORT};
pub use protocol::envelope::{JobDecoder, MalformedJobError, PrintJob, ESCPOS_FIELD};
