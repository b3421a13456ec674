//! Authenticated message construction
//!
//! The message is a UTC timestamp in `YYYYMMDDTHHMMSS` form followed by a
//! random suffix. The suffix only varies the signed payload; nothing tracks
//! it for uniqueness.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt;

use crate::{Error, Result};

/// Total message length in bytes
pub const MESSAGE_LEN: usize = 50;

/// Length of the leading timestamp
pub const TIMESTAMP_LEN: usize = 15;

/// Length of the random suffix
pub const NONCE_LEN: usize = MESSAGE_LEN - TIMESTAMP_LEN;

/// chrono format for the leading timestamp
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

const NONCE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-";

/// A 50-character timestamped message, created per request and never stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedMessage(String);

impl AuthenticatedMessage {
    /// Build a message for `now` using the operating system's secure RNG
    pub fn new(now: DateTime<Utc>) -> Result<Self> {
        Self::with_rng(now, &mut OsRng)
    }

    /// Build a message for `now` drawing the suffix from `rng`
    pub fn with_rng<R: RngCore>(now: DateTime<Utc>, rng: &mut R) -> Result<Self> {
        let mut message = format_timestamp(now);
        if message.len() != TIMESTAMP_LEN {
            return Err(Error::signing(format!(
                "timestamp {} is not {} characters",
                message, TIMESTAMP_LEN
            )));
        }

        message.push_str(&random_suffix(rng, NONCE_LEN)?);
        Ok(Self(message))
    }

    /// The timestamp encoded at the front of the message
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.0[..TIMESTAMP_LEN])
    }

    /// Borrow the message text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the message text
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AuthenticatedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Format a UTC time as `YYYYMMDDTHHMMSS`
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a `YYYYMMDDTHHMMSS` timestamp, interpreted as UTC
///
/// Anything that is not exactly 15 characters in that layout is `None`.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if text.len() != TIMESTAMP_LEN || !text.is_ascii() {
        return None;
    }

    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Draw `len` symbols from the nonce alphabet
///
/// Each random byte is masked to 6 bits and the one value past the end of
/// the alphabet is discarded, so every symbol is equally likely.
fn random_suffix<R: RngCore>(rng: &mut R, len: usize) -> Result<String> {
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];

    while out.len() < len {
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| Error::signing(format!("secure random source failed: {}", e)))?;

        for byte in buf {
            let index = usize::from(byte & 0x3f);
            if index < NONCE_ALPHABET.len() {
                out.push(char::from(NONCE_ALPHABET[index]));
                if out.len() == len {
                    break;
                }
            }
        }
    }

    Ok(out)
}
