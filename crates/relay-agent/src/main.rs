//! Print relay agent: entry point.
//!
//! Connects to the print server over WebSocket, receives ESC/POS jobs, and
//! writes them to the configured receipt printer.  The agent reconnects on
//! its own after any disconnect and only stops on SIGINT or SIGTERM.
//!
//! # Usage
//!
//! ```text
//! print-agent [OPTIONS]
//!
//! Options:
//!   -c, --config <PATH>   Path to the TOML config file [default: print-agent.toml]
//!       --dry-run         Log jobs instead of sending them to the printer
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable             | Default            | Description               |
//! |----------------------|--------------------|---------------------------|
//! | `PRINT_AGENT_CONFIG` | `print-agent.toml` | Config file path          |
//! | `RUST_LOG`           | `logging.level`    | Log filter directive      |
//!
//! # What happens at startup
//!
//! 1. CLI arguments are parsed with `clap`.
//! 2. The config file is loaded and validated; any problem here exits with a
//!    non-zero status before a connection is attempted.
//! 3. Logging is initialised (stdout, plus the log file if configured).
//! 4. The printer adapter and WebSocket transport are built.
//! 5. Signal handlers are spawned; they flip a `watch` channel to `true`.
//! 6. [`ReconnectSupervisor::run`] takes over until shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, error, info};

use relay_agent::application::sink::DeviceSink;
use relay_agent::application::supervisor::ReconnectSupervisor;
use relay_agent::infrastructure::config::load_config;
use relay_agent::infrastructure::logging::init_logging;
use relay_agent::infrastructure::printer::{build_sink, DryRunSink};
use relay_agent::infrastructure::transport::WsTransport;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Print relay agent.
///
/// Receives base64-encoded ESC/POS jobs over WebSocket and prints them on a
/// USB or network receipt printer.
#[derive(Debug, Parser)]
#[command(
    name = "print-agent",
    about = "Relays ESC/POS print jobs from a WebSocket server to a local receipt printer",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "print-agent.toml", env = "PRINT_AGENT_CONFIG")]
    config: PathBuf,

    /// Accept jobs and log their size without touching the printer.
    #[arg(long)]
    dry_run: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_config(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?
        .into_settings()
        .context("invalid configuration")?;

    init_logging(&settings.logging).context("failed to initialise logging")?;

    // wss:// needs a process-wide crypto provider.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let sink: Arc<dyn DeviceSink> = if cli.dry_run {
        Arc::new(DryRunSink::new(settings.target.clone()))
    } else {
        build_sink(&settings.target, settings.printer)
    };

    info!(
        org = settings.endpoint.org_id(),
        printer = %sink.describe(),
        reconnect_delay_secs = settings.supervisor.reconnect_delay.as_secs(),
        "print agent starting"
    );

    // ── Graceful shutdown ─────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let supervisor = ReconnectSupervisor::new(
        settings.endpoint,
        WsTransport::default(),
        sink,
        settings.supervisor,
    );
    let exit = supervisor.run(shutdown_rx).await;

    info!(?exit, "print agent stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or on SIGTERM where available.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    res = tokio::signal::ctrl_c() => match res {
                        Ok(()) => info!("received Ctrl+C, shutting down"),
                        Err(e) => {
                            error!("failed to listen for Ctrl+C signal: {e}");
                            term.recv().await;
                            info!("received SIGTERM, shutting down");
                        }
                    },
                    _ = term.recv() => info!("received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => error!("failed to listen for SIGTERM: {e}"),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down"),
        Err(e) => {
            // No signal source left; run until killed.
            error!("failed to listen for Ctrl+C signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
