//! Receiving-side verification
//!
//! Each gate short-circuits. The reason for a rejection is kept inside the
//! process (logged at debug level); callers of [`Verifier::verify`] only see
//! `false`, so malformed and forged headers look the same from outside.

use chrono::{DateTime, Duration, Utc};
use p384::ecdsa::signature::hazmat::PrehashVerifier;
use p384::ecdsa::VerifyingKey;
use sha2::{Digest, Sha512};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use super::keys;
use super::message::{MESSAGE_LEN, TIMESTAMP_LEN, parse_timestamp};
use super::signature::decode_signature;
use crate::Result;

/// Shortest accepted `Authentication` header, in bytes
pub const MIN_HEADER_LEN: usize = 150;

/// Longest accepted `Authentication` header, in bytes
pub const MAX_HEADER_LEN: usize = 300;

/// Allowed distance between the message timestamp and now, either direction
pub const FRESHNESS_WINDOW_SECS: i64 = 10 * 60;

/// Why a header was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no Authentication header")]
    MissingHeader,

    #[error("{0} Authentication headers, expected one")]
    DuplicateHeader(usize),

    #[error("header length {0} outside [{min}, {max}]", min = MIN_HEADER_LEN, max = MAX_HEADER_LEN)]
    InvalidLength(usize),

    #[error("timestamp is not YYYYMMDDTHHMMSS")]
    InvalidTimestamp,

    #[error("timestamp {0} outside freshness window")]
    OutsideWindow(DateTime<Utc>),

    #[error("signature is not valid base64")]
    InvalidBase64,

    #[error("signature is not a valid (R, S) pair")]
    MalformedSignature,

    #[error("signature does not match message")]
    SignatureMismatch,
}

/// Verifies `Authentication` headers against the shared public key
#[derive(Debug, Clone)]
pub struct Verifier {
    key: VerifyingKey,
    window: Duration,
}

impl Verifier {
    /// Create a verifier with the standard freshness window
    pub fn new(key: VerifyingKey) -> Self {
        Self {
            key,
            window: Duration::seconds(FRESHNESS_WINDOW_SECS),
        }
    }

    /// Load the public key from a base64/PEM file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(keys::load_public_key(path)?))
    }

    /// Accept or reject the values of a request's `Authentication` header
    pub fn verify(&self, headers: &[&str]) -> bool {
        self.verify_at(headers, Utc::now())
    }

    /// [`Verifier::verify`] against an explicit clock
    pub fn verify_at(&self, headers: &[&str], now: DateTime<Utc>) -> bool {
        match self.check(headers, now) {
            Ok(()) => true,
            Err(reason) => {
                debug!(%reason, "rejected authentication header");
                false
            }
        }
    }

    /// Run every gate and report the first one that fails
    pub fn check(
        &self,
        headers: &[&str],
        now: DateTime<Utc>,
    ) -> std::result::Result<(), AuthError> {
        let header = match headers {
            [] => return Err(AuthError::MissingHeader),
            [single] => *single,
            many => return Err(AuthError::DuplicateHeader(many.len())),
        };

        if !(MIN_HEADER_LEN..=MAX_HEADER_LEN).contains(&header.len()) {
            return Err(AuthError::InvalidLength(header.len()));
        }

        let timestamp = header
            .get(..TIMESTAMP_LEN)
            .and_then(parse_timestamp)
            .ok_or(AuthError::InvalidTimestamp)?;

        if timestamp < now - self.window || timestamp > now + self.window {
            return Err(AuthError::OutsideWindow(timestamp));
        }

        let (message, signature) = header
            .get(..MESSAGE_LEN)
            .zip(header.get(MESSAGE_LEN..))
            .ok_or(AuthError::MalformedSignature)?;

        self.verify_signature(message, signature)
    }

    /// Check a base64 `R || S` signature over the SHA-512 hash of `message`
    pub fn verify_signature(
        &self,
        message: &str,
        encoded: &str,
    ) -> std::result::Result<(), AuthError> {
        let signature = decode_signature(encoded)?;
        let digest = Sha512::digest(message.as_bytes());

        self.key
            .verify_prehash(&digest, &signature)
            .map_err(|_| AuthError::SignatureMismatch)
    }
}
