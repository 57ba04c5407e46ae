//! Network printer (raw TCP, port 9100 by default).
//!
//! Each job opens a fresh connection, writes the bytes, flushes, and shuts
//! the write half down so the printer sees end-of-job.  Nothing is kept open
//! between jobs.

use async_trait::async_trait;
use relay_core::protocol::escpos::append_partial_cut;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument};

use super::PrinterOptions;
use crate::application::sink::{DeviceError, DeviceSink};

/// Writes jobs to `host:port` over TCP.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    options: PrinterOptions,
}

impl NetworkPrinter {
    pub fn new(host: impl Into<String>, port: u16, options: PrinterOptions) -> Self {
        Self {
            host: host.into(),
            port,
            options,
        }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl DeviceSink for NetworkPrinter {
    #[instrument(skip_all, fields(addr = %self.addr(), len = command_bytes.len()))]
    async fn send(&self, command_bytes: &[u8]) -> Result<(), DeviceError> {
        let limit = self.options.timeout;

        let mut stream = timeout(limit, TcpStream::connect((self.host.as_str(), self.port)))
            .await
            .map_err(|_| DeviceError::Timeout { stage: "connecting" })?
            .map_err(|source| DeviceError::Connection {
                addr: self.addr(),
                source,
            })?;
        debug!("connected");

        let with_cut;
        let bytes = if self.options.cut_after_job {
            with_cut = append_partial_cut(command_bytes);
            with_cut.as_slice()
        } else {
            command_bytes
        };

        timeout(limit, stream.write_all(bytes))
            .await
            .map_err(|_| DeviceError::Timeout { stage: "writing" })??;

        timeout(limit, async {
            stream.flush().await?;
            stream.shutdown().await
        })
        .await
        .map_err(|_| DeviceError::Timeout { stage: "finalizing" })?
        .map_err(|e| DeviceError::Finalize(e.to_string()))?;

        debug!(written = bytes.len(), "job written");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("network printer {}", self.addr())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Accepts one connection and returns everything the client wrote.
    async fn capture_one() -> (u16, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });
        (port, handle)
    }

    #[tokio::test]
    async fn test_send_writes_bytes_verbatim() {
        // Arrange
        let (port, received) = capture_one().await;
        let printer = NetworkPrinter::new("127.0.0.1", port, PrinterOptions::default());
        let job = vec![0x1B, 0x40, b'H', b'i', 0x0A];

        // Act
        tokio_test::assert_ok!(printer.send(&job).await);

        // Assert
        assert_eq!(received.await.unwrap(), job);
    }

    #[tokio::test]
    async fn test_send_appends_cut_when_configured() {
        let (port, received) = capture_one().await;
        let options = PrinterOptions {
            cut_after_job: true,
            ..PrinterOptions::default()
        };
        let printer = NetworkPrinter::new("127.0.0.1", port, options);

        printer.send(&[0x1B, 0x40]).await.unwrap();

        assert_eq!(received.await.unwrap(), vec![0x1B, 0x40, 0x1D, 0x56, 0x01]);
    }

    #[tokio::test]
    async fn test_send_to_closed_port_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let options = PrinterOptions {
            timeout: Duration::from_secs(2),
            ..PrinterOptions::default()
        };
        let printer = NetworkPrinter::new("127.0.0.1", port, options);

        let err = tokio_test::assert_err!(printer.send(&[0x1B, 0x40]).await);

        let expected = format!("127.0.0.1:{port}");
        assert!(
            matches!(err, DeviceError::Connection { ref addr, .. } if *addr == expected),
            "unexpected error {err:?}"
        );
    }

    #[test]
    fn test_describe_includes_address() {
        let printer = NetworkPrinter::new("printer.local", 9100, PrinterOptions::default());
        assert_eq!(printer.describe(), "network printer printer.local:9100");
    }
}
