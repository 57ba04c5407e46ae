//! TOML configuration for the print agent.
//!
//! The file is read once at startup and turned into [`AgentSettings`], which
//! is what the rest of the agent receives.  Nothing reads configuration after
//! that point.
//!
//! ```toml
//! [server]
//! ws_url = "wss://api.example.com/ws/print/"
//! org_id = "org-123"
//! api_key = "secret"
//!
//! [printer]
//! kind = "usb"
//! vendor_id = "0x04b8"
//! product_id = "0x0202"
//!
//! [logging]
//! level = "info"
//! file = "print_agent.log"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, so a minimal file only needs the
//! organisation id, the API key, and the printer selection.

use std::path::{Path, PathBuf};
use std::time::Duration;

use relay_core::{DeviceTarget, Endpoint, EndpointError, DEFAULT_NETWORK_PORT};
use serde::Deserialize;
use thiserror::Error;

use crate::application::supervisor::SupervisorConfig;
use crate::infrastructure::printer::PrinterOptions;

/// Error type for loading and validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parsed but do not describe a usable setup.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// The server section does not form a valid endpoint.
    #[error("invalid server settings: {0}")]
    Endpoint(#[from] EndpointError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub printer: PrinterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where to connect and how to authenticate.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Base WebSocket URL; the org id and key are appended to it.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    pub org_id: String,
    pub api_key: String,
    /// Wait between a disconnect and the next attempt.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

/// Printer connection kind.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrinterKind {
    #[serde(alias = "USB", alias = "Usb")]
    Usb,
    #[serde(alias = "NETWORK", alias = "Network", alias = "lan", alias = "LAN")]
    Network,
}

/// Printer selection and device options.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PrinterConfig {
    #[serde(default = "default_printer_kind")]
    pub kind: PrinterKind,
    /// USB vendor id as hex, `"0x"` prefix optional.
    pub vendor_id: Option<String>,
    /// USB product id as hex, `"0x"` prefix optional.
    pub product_id: Option<String>,
    /// Network printer host name or IP.
    pub host: Option<String>,
    #[serde(default = "default_printer_port")]
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause after each successful print.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default)]
    pub cut_after_job: bool,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also append logs to this file.  An empty string disables file output.
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// The log file to append to, if file output is enabled.
    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref().filter(|p| !p.as_os_str().is_empty())
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_ws_url() -> String {
    "wss://api.yourdomain.com/ws/print/".to_string()
}
fn default_reconnect_delay_secs() -> u64 {
    5
}
fn default_printer_kind() -> PrinterKind {
    PrinterKind::Usb
}
fn default_printer_port() -> u16 {
    DEFAULT_NETWORK_PORT
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_settle_ms() -> u64 {
    500
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("print_agent.log"))
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

// ── Validated settings ────────────────────────────────────────────────────────

/// Everything the agent needs at runtime, validated.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub endpoint: Endpoint,
    pub target: DeviceTarget,
    pub supervisor: SupervisorConfig,
    pub printer: PrinterOptions,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed or a required
    /// field is missing.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validates the file contents and builds the runtime settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Endpoint`] for empty server fields and
    /// [`ConfigError::Invalid`] for an incomplete printer section.
    pub fn into_settings(self) -> Result<AgentSettings, ConfigError> {
        let endpoint = Endpoint::new(
            &self.server.ws_url,
            &self.server.org_id,
            &self.server.api_key,
        )?;
        let target = self.printer.target()?;

        Ok(AgentSettings {
            endpoint,
            target,
            supervisor: SupervisorConfig {
                reconnect_delay: Duration::from_secs(self.server.reconnect_delay_secs),
                settle_delay: Duration::from_millis(self.printer.settle_ms),
            },
            printer: PrinterOptions {
                timeout: Duration::from_secs(self.printer.timeout_secs),
                cut_after_job: self.printer.cut_after_job,
            },
            logging: self.logging,
        })
    }
}

impl PrinterConfig {
    /// Resolves the configured printer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the fields required by `kind` are
    /// missing or malformed.
    pub fn target(&self) -> Result<DeviceTarget, ConfigError> {
        match self.kind {
            PrinterKind::Usb => Ok(DeviceTarget::Usb {
                vendor_id: parse_usb_id("vendor_id", self.vendor_id.as_deref())?,
                product_id: parse_usb_id("product_id", self.product_id.as_deref())?,
            }),
            PrinterKind::Network => {
                let host = self
                    .host
                    .as_deref()
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| {
                        ConfigError::Invalid(
                            "printer.host is required for a network printer".into(),
                        )
                    })?;
                if self.port == 0 {
                    return Err(ConfigError::Invalid("printer.port must not be 0".into()));
                }
                Ok(DeviceTarget::Network {
                    host: host.to_string(),
                    port: self.port,
                })
            }
        }
    }
}

/// Parses a USB id written as hex, with or without a `0x` prefix.
fn parse_usb_id(field: &str, value: Option<&str>) -> Result<u16, ConfigError> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ConfigError::Invalid(format!("printer.{field} is required for a usb printer"))
        })?;
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    u16::from_str_radix(digits, 16).map_err(|_| {
        ConfigError::Invalid(format!("printer.{field} {raw:?} is not a 16-bit hex id"))
    })
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Reads and parses the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read (including when it
/// does not exist) and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_toml(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
