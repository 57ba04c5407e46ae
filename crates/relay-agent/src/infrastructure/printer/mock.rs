//! In-memory printer for tests.
//!
//! # Why a recording sink?
//!
//! The real adapters need a printer on the desk (or at least a listening
//! socket).  `RecordingSink` stores every job in a `Mutex<Vec<..>>` so tests
//! can assert exactly which bytes reached the "printer" and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let sink = Arc::new(RecordingSink::new());
//! let mut session = ConnectionSession::new(sink.clone(), Duration::ZERO);
//! session.on_open();
//! session.on_frame(br#"{"escpos":"GxkiwDE="}"#).await;
//!
//! assert_eq!(sink.jobs(), vec![vec![0x1B, 0x19, 0x22, 0xC0, 0x31]]);
//! ```
//!
//! # `should_fail` flag
//!
//! Set `should_fail` to make every `send` return a device error.  Failed jobs
//! are counted in `attempts` but not recorded in `jobs`.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::sink::{DeviceError, DeviceSink};

/// A sink that records every job it receives.
#[derive(Default)]
pub struct RecordingSink {
    /// Bytes of every successful job, in arrival order.
    pub jobs: Mutex<Vec<Vec<u8>>>,
    /// Number of `send` calls, successful or not.
    pub attempts: AtomicUsize,
    /// When `true`, `send` fails with [`DeviceError::NotFound`].
    pub should_fail: AtomicBool,
    /// Simulated print time.
    pub delay: Duration,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every `send` fails.
    pub fn failing() -> Self {
        let sink = Self::new();
        sink.should_fail.store(true, Ordering::SeqCst);
        sink
    }

    /// A sink that takes `delay` to print each job.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Snapshot of the recorded jobs.
    pub fn jobs(&self) -> Vec<Vec<u8>> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceSink for RecordingSink {
    async fn send(&self, command_bytes: &[u8]) -> Result<(), DeviceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DeviceError::NotFound {
                target: "mock".to_string(),
            });
        }
        self.jobs.lock().unwrap().push(command_bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "recording sink".to_string()
    }
}
