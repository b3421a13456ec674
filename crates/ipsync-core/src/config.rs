//! Configuration types for ipsync
//!
//! The binaries fill these from flags or `IPSYNC_*` environment variables
//! and call `validate()` before touching any key or address file.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::Error;

/// Default listen address of the listener
pub const DEFAULT_LISTEN: &str = ":8090";

/// Default poller request timeout (in seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// File holding the last known address
    pub address_file: PathBuf,

    /// Executable run as `--old=<ip> --new=<ip>` on change
    pub update_action: PathBuf,

    /// Base64/PEM public key of the reporting peer
    pub public_key: PathBuf,

    /// Listen address; `:PORT` binds all interfaces
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl ListenerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        require_file("address file", &self.address_file)?;
        require_file("update action", &self.update_action)?;
        require_file("public key", &self.public_key)?;
        self.listen_addr()?;
        Ok(())
    }

    /// Resolve the listen address
    pub fn listen_addr(&self) -> Result<SocketAddr, Error> {
        parse_listen_addr(&self.listen)
    }
}

/// Poller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Base64/PEM private key
    pub private_key: PathBuf,

    /// Full URL of the listener's `/ping` endpoint
    pub listener_url: String,

    /// Repeat every N seconds instead of sending a single report
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl PollerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        require_file("private key", &self.private_key)?;

        if !self.listener_url.starts_with("http://") && !self.listener_url.starts_with("https://")
        {
            return Err(Error::config(format!(
                "Listener URL must use HTTP or HTTPS scheme. Got: {}",
                self.listener_url
            )));
        }

        if let Some(interval) = self.interval_secs
            && !(10..=86_400).contains(&interval)
        {
            return Err(Error::config(format!(
                "Interval must be between 10 and 86400 seconds. Got: {}",
                interval
            )));
        }

        if !(1..=300).contains(&self.timeout_secs) {
            return Err(Error::config(format!(
                "Timeout must be between 1 and 300 seconds. Got: {}",
                self.timeout_secs
            )));
        }

        Ok(())
    }
}

/// Parse `host:port`, `[v6]:port` or `:port` (all IPv4 interfaces)
pub fn parse_listen_addr(listen: &str) -> Result<SocketAddr, Error> {
    if let Some(port) = listen.strip_prefix(':') {
        let port: u16 = port
            .parse()
            .map_err(|_| Error::config(format!("Invalid listen port in '{}'", listen)))?;
        return Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
    }

    listen
        .parse()
        .map_err(|e| Error::config(format!("Invalid listen address '{}': {}", listen, e)))
}

/// Parse a log level name
pub fn parse_log_level(level: &str) -> Result<tracing::Level, Error> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => Err(Error::config(format!(
            "Log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            level
        ))),
    }
}

fn require_file(what: &str, path: &Path) -> Result<(), Error> {
    if !path.is_file() {
        return Err(Error::config(format!(
            "Could not find {} at '{}'",
            what,
            path.display()
        )));
    }
    Ok(())
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
