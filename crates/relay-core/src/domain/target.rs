//! Printer target selection.
//!
//! Receipt printers are reached either over USB (identified by the vendor
//! and product ids in their device descriptor) or over the LAN using the
//! raw TCP "JetDirect" port, conventionally 9100.

use std::fmt;

/// Conventional raw-print TCP port for networked receipt printers.
pub const DEFAULT_NETWORK_PORT: u16 = 9100;

/// Which physical printer the agent writes to.
///
/// Chosen once from configuration at startup; the agent builds the matching
/// device adapter from it and never changes it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceTarget {
    /// A printer attached over USB.
    Usb { vendor_id: u16, product_id: u16 },
    /// A printer listening on a raw TCP port.
    Network { host: String, port: u16 },
}

impl DeviceTarget {
    /// Convenience constructor for a network printer on [`DEFAULT_NETWORK_PORT`].
    pub fn network(host: impl Into<String>) -> Self {
        Self::Network {
            host: host.into(),
            port: DEFAULT_NETWORK_PORT,
        }
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usb {
                vendor_id,
                product_id,
            } => write!(f, "usb:{vendor_id:04x}:{product_id:04x}"),
            Self::Network { host, port } => write!(f, "tcp:{host}:{port}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_constructor_uses_port_9100() {
        let target = DeviceTarget::network("192.168.1.50");
        assert_eq!(
            target,
            DeviceTarget::Network {
                host: "192.168.1.50".to_string(),
                port: 9100
            }
        );
    }

    #[test]
    fn test_usb_display_is_zero_padded_hex() {
        let target = DeviceTarget::Usb {
            vendor_id: 0x04b8,
            product_id: 0x202,
        };
        assert_eq!(target.to_string(), "usb:04b8:0202");
    }

    #[test]
    fn test_network_display_includes_port() {
        let target = DeviceTarget::Network {
            host: "printer.local".to_string(),
            port: 9101,
        };
        assert_eq!(target.to_string(), "tcp:printer.local:9101");
    }
}
