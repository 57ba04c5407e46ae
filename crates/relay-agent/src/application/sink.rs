//! Device port: delivering one command buffer to the printer.
//!
//! Implementations live in `infrastructure::printer`.  Every call acquires
//! the device, writes, finalizes, and releases it again; no handle is held
//! between jobs, so two calls never contend for a lock inside the agent.
//! Implementations must not retry: a failed job is dropped by the caller.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while delivering a job to the printer.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No printer matching the configured target is present.
    #[error("printer {target} not found")]
    NotFound { target: String },

    /// The network printer refused or dropped the connection.
    #[error("could not connect to printer at {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A device operation did not finish within the configured timeout.
    #[error("printer timed out while {stage}")]
    Timeout { stage: &'static str },

    /// Writing the command bytes failed.
    #[error("printer I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A USB enumeration, claim, or transfer step failed.
    #[error("USB error while {stage}: {message}")]
    Usb { stage: &'static str, message: String },

    /// The bytes were written but the device could not be finalized.
    #[error("failed to finalize print job: {0}")]
    Finalize(String),
}

/// Something that can print a raw ESC/POS buffer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceSink: Send + Sync {
    /// Delivers `command_bytes` to the device verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError`] if the device is missing, busy, or fails
    /// mid-command.  The device handle is released before returning.
    async fn send(&self, command_bytes: &[u8]) -> Result<(), DeviceError>;

    /// Short description of the device for log output.
    fn describe(&self) -> String;
}
