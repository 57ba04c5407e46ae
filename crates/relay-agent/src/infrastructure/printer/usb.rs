//! USB receipt printer via `nusb`.
//!
//! For every job the printer is located by vendor/product id, the interface
//! holding the first bulk OUT endpoint is claimed (detaching a kernel
//! driver such as `usblp` if one is bound), the bytes are sent in a single
//! bulk transfer, and the device is released again when the handles drop.

use async_trait::async_trait;
use nusb::transfer::{Direction, EndpointType};
use relay_core::protocol::escpos::append_partial_cut;
use tokio::time::timeout;
use tracing::{debug, instrument};

use super::PrinterOptions;
use crate::application::sink::{DeviceError, DeviceSink};

/// Writes jobs to the USB printer with the given ids.
#[derive(Debug, Clone)]
pub struct UsbPrinter {
    vendor_id: u16,
    product_id: u16,
    options: PrinterOptions,
}

/// Interface number and endpoint address of a bulk OUT endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BulkOut {
    interface: u8,
    endpoint: u8,
}

impl UsbPrinter {
    pub fn new(vendor_id: u16, product_id: u16, options: PrinterOptions) -> Self {
        Self {
            vendor_id,
            product_id,
            options,
        }
    }

    fn ids(&self) -> String {
        format!("{:04x}:{:04x}", self.vendor_id, self.product_id)
    }

    fn open(&self) -> Result<nusb::Device, DeviceError> {
        let info = nusb::list_devices()
            .map_err(|e| DeviceError::Usb {
                stage: "enumerating devices",
                message: e.to_string(),
            })?
            .find(|d| d.vendor_id() == self.vendor_id && d.product_id() == self.product_id)
            .ok_or_else(|| DeviceError::NotFound {
                target: format!("usb:{}", self.ids()),
            })?;

        info.open().map_err(|e| DeviceError::Usb {
            stage: "opening device",
            message: e.to_string(),
        })
    }

    fn find_bulk_out(device: &nusb::Device) -> Result<BulkOut, DeviceError> {
        let config = device.active_configuration().map_err(|e| DeviceError::Usb {
            stage: "reading configuration",
            message: e.to_string(),
        })?;

        for alt in config.interface_alt_settings() {
            if let Some(ep) = alt.endpoints().find(|ep| {
                ep.direction() == Direction::Out && ep.transfer_type() == EndpointType::Bulk
            }) {
                return Ok(BulkOut {
                    interface: alt.interface_number(),
                    endpoint: ep.address(),
                });
            }
        }

        Err(DeviceError::Usb {
            stage: "locating endpoint",
            message: "no bulk OUT endpoint in active configuration".to_string(),
        })
    }
}

#[async_trait]
impl DeviceSink for UsbPrinter {
    #[instrument(skip_all, fields(device = %self.ids(), len = command_bytes.len()))]
    async fn send(&self, command_bytes: &[u8]) -> Result<(), DeviceError> {
        let device = self.open()?;
        let out = Self::find_bulk_out(&device)?;
        debug!(interface = out.interface, endpoint = out.endpoint, "using bulk OUT endpoint");

        let interface = device
            .detach_and_claim_interface(out.interface)
            .map_err(|e| DeviceError::Usb {
                stage: "claiming interface",
                message: e.to_string(),
            })?;

        let data = if self.options.cut_after_job {
            append_partial_cut(command_bytes)
        } else {
            command_bytes.to_vec()
        };
        let expected = data.len();

        let completion = timeout(self.options.timeout, interface.bulk_out(out.endpoint, data))
            .await
            .map_err(|_| DeviceError::Timeout { stage: "writing" })?;
        let written = completion
            .into_result()
            .map_err(|e| DeviceError::Usb {
                stage: "bulk transfer",
                message: e.to_string(),
            })?
            .actual_length();

        if written != expected {
            return Err(DeviceError::Finalize(format!(
                "short write: {written} of {expected} bytes"
            )));
        }

        debug!(written, "job written");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("usb printer {}", self.ids())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_uses_hex_ids() {
        let printer = UsbPrinter::new(0x0416, 0x5011, PrinterOptions::default());
        assert_eq!(printer.describe(), "usb printer 0416:5011");
    }

    #[tokio::test]
    async fn test_send_to_absent_device_fails_without_panicking() {
        // No real printer uses these ids; enumeration either finds nothing or
        // is not permitted in the test environment.
        let printer = UsbPrinter::new(0xFFFE, 0xFFFD, PrinterOptions::default());

        let err = printer.send(&[0x1B, 0x40]).await.unwrap_err();

        assert!(
            matches!(err, DeviceError::NotFound { .. } | DeviceError::Usb { .. }),
            "unexpected error {err:?}"
        );
    }
}
