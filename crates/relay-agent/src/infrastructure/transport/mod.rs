//! Transport adapters implementing the application `Transport` port.
//!
//! - **`ws`** – tokio-tungstenite WebSocket client used in production.
//! - **`mock`** – scripted transport that replays canned events, for tests.

pub mod mock;
pub mod ws;

pub use ws::{WsConnection, WsTransport};
