//! Printer adapters implementing [`DeviceSink`].
//!
//! - [`NetworkPrinter`]: raw TCP (port 9100 by default).
//! - [`UsbPrinter`]: bulk OUT transfers via `nusb`.
//! - [`DryRunSink`]: logs jobs instead of printing (`--dry-run`).
//! - [`mock::RecordingSink`]: in-memory sink for tests.

pub mod dry_run;
pub mod mock;
pub mod network;
pub mod usb;

use std::sync::Arc;
use std::time::Duration;

use relay_core::DeviceTarget;

use crate::application::sink::DeviceSink;

pub use dry_run::DryRunSink;
pub use network::NetworkPrinter;
pub use usb::UsbPrinter;

/// Default limit for each device operation (connect, write, finalize).
pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(10);

/// Options shared by the real printer adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterOptions {
    /// Limit for each device operation.
    pub timeout: Duration,
    /// Append a partial cut after every job.
    pub cut_after_job: bool,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DEVICE_TIMEOUT,
            cut_after_job: false,
        }
    }
}

/// Builds the adapter for `target`.
pub fn build_sink(target: &DeviceTarget, options: PrinterOptions) -> Arc<dyn DeviceSink> {
    match target {
        DeviceTarget::Usb {
            vendor_id,
            product_id,
        } => Arc::new(UsbPrinter::new(*vendor_id, *product_id, options)),
        DeviceTarget::Network { host, port } => {
            Arc::new(NetworkPrinter::new(host.clone(), *port, options))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sink_for_network_target() {
        let sink = build_sink(&DeviceTarget::network("10.0.0.7"), PrinterOptions::default());
        assert_eq!(sink.describe(), "network printer 10.0.0.7:9100");
    }

    #[test]
    fn test_build_sink_for_usb_target() {
        let target = DeviceTarget::Usb {
            vendor_id: 0x04b8,
            product_id: 0x0202,
        };
        let sink = build_sink(&target, PrinterOptions::default());
        assert_eq!(sink.describe(), "usb printer 04b8:0202");
    }
}
