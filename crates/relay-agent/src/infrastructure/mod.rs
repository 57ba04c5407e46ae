//! Infrastructure layer for the print agent.
//!
//! Contains the adapters that touch the outside world: the WebSocket client,
//! the printer drivers, the configuration file, and log output.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `relay_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`transport`** – `WsTransport` (tokio-tungstenite, `ws://` and `wss://`)
//!   plus a scripted transport for supervisor tests.
//!
//! - **`printer`** – `DeviceSink` implementations: raw TCP, USB bulk, dry
//!   run, and an in-memory recorder for tests.
//!
//! - **`config`** – TOML schema, defaults, and validation into
//!   `AgentSettings`.
//!
//! - **`logging`** – `tracing-subscriber` setup with optional file output.

pub mod config;
pub mod logging;
pub mod printer;
pub mod transport;
