//! Error types for ipsync
//!
//! Authentication failures are not represented here: the verifier
//! reports them as [`crate::auth::AuthError`] and callers only ever see a
//! boolean.

use thiserror::Error;

/// Result type alias for ipsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ipsync
#[derive(Error, Debug)]
pub enum Error {
    /// Key material could not be read or parsed
    #[error("Key error: {0}")]
    Key(String),

    /// Message or signature generation failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// The external update action failed
    #[error("Update action failed: {0}")]
    Action(String),

    /// Address store errors
    #[error("Address store error: {0}")]
    AddressStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a key error
    pub fn key(msg: impl Into<String>) -> Self {
        Self::Key(msg.into())
    }

    /// Create a signing error
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Create an update action error
    pub fn action(msg: impl Into<String>) -> Self {
        Self::Action(msg.into())
    }

    /// Create an address store error
    pub fn address_store(msg: impl Into<String>) -> Self {
        Self::AddressStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
