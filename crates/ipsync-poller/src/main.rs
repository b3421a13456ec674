// # ipsync-poller
//
// Sends a signed report to the listener, once or on an interval.
//
// ## Configuration
//
// - `IPSYNC_PRIVATE_KEY`: private key (base64 or PEM)
// - `IPSYNC_LISTENER_URL`: full URL of the listener's `/ping`
// - `IPSYNC_INTERVAL_SECS`: repeat every N seconds (10..=86400); one report if unset
// - `IPSYNC_TIMEOUT_SECS`: request timeout (default 10)
// - `IPSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
//
// ## Example
//
// ```bash
// ipsync-poller --private-key ~/.ipsync/roaming.pem \
//     --listener-url http://198.51.100.1:8090/ping
// ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use ipsync_core::config::{DEFAULT_TIMEOUT_SECS, parse_log_level};
use ipsync_core::{PollerConfig, Signer};

/// Exit codes for different termination scenarios
///
/// - 0: Report accepted, or clean shutdown in interval mode
/// - 1: Configuration or startup error
/// - 2: Report failed or was rejected
#[derive(Debug, Clone, Copy)]
enum PollerExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<PollerExitCode> for ExitCode {
    fn from(code: PollerExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Reports this host's address to an ipsync listener
#[derive(Parser, Debug)]
#[command(name = "ipsync-poller")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Private key (base64 or PEM)
    #[arg(long, env = "IPSYNC_PRIVATE_KEY")]
    private_key: PathBuf,

    /// Full URL of the listener's /ping endpoint
    #[arg(long, env = "IPSYNC_LISTENER_URL")]
    listener_url: String,

    /// Repeat every N seconds instead of sending a single report
    #[arg(long, env = "IPSYNC_INTERVAL_SECS")]
    interval_secs: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, env = "IPSYNC_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Log level
    #[arg(long, env = "IPSYNC_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> (PollerConfig, String) {
        let config = PollerConfig {
            private_key: self.private_key,
            listener_url: self.listener_url,
            interval_secs: self.interval_secs,
            timeout_secs: self.timeout_secs,
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
                PollerExitCode::ConfigError.into()
            } else {
                PollerExitCode::Success.into()
            };
        }
    };
    let (config, log_level) = cli.into_config();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return PollerExitCode::ConfigError.into();
    }

    let log_level = match parse_log_level(&log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return PollerExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return PollerExitCode::ConfigError.into();
    }

    let signer = match Signer::from_path(&config.private_key) {
        Ok(signer) => signer,
        Err(e) => {
            error!("Failed to load private key: {}", e);
            return PollerExitCode::ConfigError.into();
        }
    };

    let client = match ipsync_poller::build_client(Duration::from_secs(config.timeout_secs)) {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            return PollerExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PollerExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match config.interval_secs {
            None => report_once(&client, &signer, &config.listener_url).await,
            Some(secs) => {
                let period = Duration::from_secs(secs);
                match run_interval(&client, &signer, &config, period).await {
                    Ok(()) => PollerExitCode::Success,
                    Err(e) => {
                        error!("Poller error: {}", e);
                        PollerExitCode::RuntimeError
                    }
                }
            }
        }
    });

    code.into()
}

/// Send one report and print the listener's answer
async fn report_once(client: &reqwest::Client, signer: &Signer, url: &str) -> PollerExitCode {
    match ipsync_poller::ping(client, signer, url).await {
        Ok((status, body)) => {
            println!("Response was {}: {}", status, body);
            if status.is_success() {
                PollerExitCode::Success
            } else {
                PollerExitCode::RuntimeError
            }
        }
        Err(e) => {
            error!("Report failed: {}", e);
            PollerExitCode::RuntimeError
        }
    }
}

/// Report every `period` until CTRL-C
///
/// A failed report is logged and retried on the next tick.
async fn run_interval(
    client: &reqwest::Client,
    signer: &Signer,
    config: &PollerConfig,
    period: Duration,
) -> Result<()> {
    info!("Reporting to {} every {:?}", config.listener_url, period);

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match ipsync_poller::ping(client, signer, &config.listener_url).await {
                    Ok((status, body)) if status.is_success() => {
                        info!("Response was {}: {}", status, body);
                    }
                    Ok((status, body)) => {
                        warn!("Response was {}: {}", status, body);
                    }
                    Err(e) => {
                        warn!("Report failed: {}", e);
                    }
                }
            }
            signal = &mut shutdown => {
                signal.map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
                info!("Received shutdown signal: SIGINT");
                return Ok(());
            }
        }
    }
}
