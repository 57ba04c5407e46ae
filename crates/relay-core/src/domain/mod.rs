//! Domain layer: pure value types with no I/O.
//!
//! - **`endpoint`** – where the agent connects and how the URL is composed.
//! - **`target`** – which printer the agent writes to.
//! - **`session_state`** – the lifecycle states of one connection.

pub mod endpoint;
pub mod session_state;
pub mod target;
