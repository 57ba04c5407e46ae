//! relay-agent library crate.
//!
//! Keeps a WebSocket connection to the print server open for the lifetime of
//! the process and writes every ESC/POS job it receives to a local receipt
//! printer.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Print server (JSON over WebSocket)
//!         ↓
//! [relay-agent]
//!   ├── application/       ReconnectSupervisor → ConnectionSession → DeviceSink port
//!   └── infrastructure/
//!         ├── transport/   WebSocket client (tokio-tungstenite)
//!         ├── printer/     TCP 9100, USB bulk (nusb), dry run
//!         ├── config       TOML settings
//!         └── logging      tracing-subscriber setup
//!         ↓
//! Receipt printer (raw ESC/POS bytes)
//! ```
//!
//! Domain types and the job decoder live in `relay-core`.
//!
//! # Layer rules
//!
//! - `application` depends on `relay-core` and its own ports only.
//! - `infrastructure` implements those ports with real I/O.
//!
//! # For beginners: why ports?
//!
//! The supervisor and session only see the `Transport` and `DeviceSink`
//! traits.  Tests swap in a scripted server and an in-memory printer and run
//! the real reconnect loop on Tokio's paused clock, so a five-second retry
//! delay costs nothing in the test suite.

/// Application layer: session state machine and reconnect loop.
pub mod application;

/// Infrastructure layer: WebSocket client, printers, config, logging.
pub mod infrastructure;
