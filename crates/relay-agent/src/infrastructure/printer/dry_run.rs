//! Sink used with `--dry-run`: accepts every job and logs it.

use async_trait::async_trait;
use relay_core::DeviceTarget;
use tracing::info;

use crate::application::sink::{DeviceError, DeviceSink};

/// Logs each job instead of writing it to `target`.
#[derive(Debug, Clone)]
pub struct DryRunSink {
    target: DeviceTarget,
}

impl DryRunSink {
    pub fn new(target: DeviceTarget) -> Self {
        Self { target }
    }
}

#[async_trait]
impl DeviceSink for DryRunSink {
    async fn send(&self, command_bytes: &[u8]) -> Result<(), DeviceError> {
        info!(
            target_device = %self.target,
            len = command_bytes.len(),
            "dry run: job not sent to printer"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("dry run ({})", self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_accepts_jobs() {
        let sink = DryRunSink::new(DeviceTarget::network("10.0.0.9"));
        tokio_test::assert_ok!(sink.send(&[0x1B, 0x40]).await);
        assert_eq!(sink.describe(), "dry run (tcp:10.0.0.9:9100)");
    }
}
