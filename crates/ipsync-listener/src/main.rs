// # ipsync-listener
//
// Thin integration layer: read configuration, load keys and the address
// file, then serve `GET /ping` until SIGTERM/SIGINT. All protocol and
// reconciliation logic lives in ipsync-core.
//
// ## Configuration
//
// Every flag can also be set through the environment:
//
// - `IPSYNC_ADDRESS_FILE`: file holding the last known address
// - `IPSYNC_UPDATE_ACTION`: executable run as `--old=<ip> --new=<ip>`
// - `IPSYNC_PUBLIC_KEY`: public key of the reporting peer
// - `IPSYNC_LISTEN`: listen address, `:PORT` for all interfaces (default `:8090`)
// - `IPSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
//
// ## Example
//
// ```bash
// export IPSYNC_ADDRESS_FILE=/var/lib/ipsync/address
// export IPSYNC_UPDATE_ACTION=/etc/ipsync/update-firewall.sh
// export IPSYNC_PUBLIC_KEY=/etc/ipsync/roaming.pub
//
// ipsync-listener --listen :8090
// ```

use anyhow::{Context, Result};
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use ipsync_core::ListenerConfig;
use ipsync_core::config::{DEFAULT_LISTEN, parse_log_level};
use ipsync_listener::AppState;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy)]
enum ListenerExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<ListenerExitCode> for ExitCode {
    fn from(code: ListenerExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Receives signed address reports and runs an action when the address changes
#[derive(Parser, Debug)]
#[command(name = "ipsync-listener")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File holding the last known address
    #[arg(long, env = "IPSYNC_ADDRESS_FILE")]
    address_file: PathBuf,

    /// Executable run as `--old=<ip> --new=<ip>` when the address changes
    #[arg(long, env = "IPSYNC_UPDATE_ACTION")]
    update_action: PathBuf,

    /// Public key (base64 or PEM) of the reporting peer
    #[arg(long, env = "IPSYNC_PUBLIC_KEY")]
    public_key: PathBuf,

    /// Listen address; `:PORT` binds all interfaces
    #[arg(long, env = "IPSYNC_LISTEN", default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Log level
    #[arg(long, env = "IPSYNC_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> (ListenerConfig, String) {
        let config = ListenerConfig {
            address_file: self.address_file,
            update_action: self.update_action,
            public_key: self.public_key,
            listen: self.listen,
        };
        (config, self.log_level)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ListenerExitCode::ConfigError.into()
            } else {
                ListenerExitCode::CleanShutdown.into()
            };
        }
    };
    let (config, log_level) = cli.into_config();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ListenerExitCode::ConfigError.into();
    }

    let log_level = match parse_log_level(&log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return ListenerExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ListenerExitCode::ConfigError.into();
    }

    info!("Starting ipsync-listener");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ListenerExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        let (listener, state) = match start(&config).await {
            Ok(started) => started,
            Err(e) => {
                error!("Startup failed: {:#}", e);
                return ListenerExitCode::ConfigError;
            }
        };

        let shutdown = match shutdown_signal() {
            Ok(shutdown) => shutdown,
            Err(e) => {
                error!("{}", e);
                return ListenerExitCode::RuntimeError;
            }
        };

        match ipsync_listener::serve(listener, state, shutdown).await {
            Ok(()) => {
                info!("Shutting down listener");
                ListenerExitCode::CleanShutdown
            }
            Err(e) => {
                error!("Server error: {}", e);
                ListenerExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// Load state and bind the socket
async fn start(config: &ListenerConfig) -> Result<(TcpListener, Arc<AppState>)> {
    let addr = config.listen_addr()?;
    let state = AppState::from_config(config)
        .await
        .context("Failed to initialize listener state")?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    Ok((listener, Arc::new(state)))
}

/// Resolves on SIGTERM or SIGINT
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Resolves on CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: SIGINT"),
            Err(e) => error!("Failed to wait for CTRL-C: {}", e),
        }
    })
}
