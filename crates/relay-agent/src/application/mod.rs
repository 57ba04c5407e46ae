//! Application layer for the print relay agent.
//!
//! # What lives here?
//!
//! - **`transport`** – The port the supervisor uses to open connections and
//!   pull events.  The WebSocket adapter lives in the infrastructure layer.
//!
//! - **`sink`** – The port for delivering a command buffer to the printer.
//!   Network, USB, and in-memory adapters live in the infrastructure layer.
//!
//! - **`session`** – `ConnectionSession`, the per-connection state machine
//!   that decodes frames and dispatches jobs to the sink.
//!
//! - **`supervisor`** – `ReconnectSupervisor`, the process-lifetime loop that
//!   opens sessions, waits out failures, and reconnects.
//!
//! **Dependency rule**: nothing in this layer imports `infrastructure`.

pub mod session;
pub mod sink;
pub mod supervisor;
pub mod transport;
