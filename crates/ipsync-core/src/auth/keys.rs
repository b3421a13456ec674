//! Key material loading
//!
//! Keys are stored as base64 DER, optionally wrapped in PEM marker lines.
//! Whitespace anywhere in the body is ignored.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use p384::ecdsa::{SigningKey, VerifyingKey};
use p384::pkcs8::{DecodePrivateKey, DecodePublicKey};
use p384::SecretKey;
use std::path::Path;

use crate::{Error, Result};

/// Strip PEM markers and whitespace, then base64-decode the remainder
pub fn decode_key_text(text: &str) -> Result<Vec<u8>> {
    let body: String = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("-----"))
        .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
        .collect();

    if body.is_empty() {
        return Err(Error::key("key text is empty"));
    }

    STANDARD
        .decode(body.as_bytes())
        .map_err(|e| Error::key(format!("key is not valid base64: {}", e)))
}

/// Parse a SubjectPublicKeyInfo public key from base64/PEM text
pub fn public_key_from_text(text: &str) -> Result<VerifyingKey> {
    let der = decode_key_text(text)?;
    VerifyingKey::from_public_key_der(&der)
        .map_err(|e| Error::key(format!("not a P-384 public key: {}", e)))
}

/// Parse a SEC1 (`EC PRIVATE KEY`) or PKCS#8 private key from base64/PEM text
pub fn private_key_from_text(text: &str) -> Result<SigningKey> {
    let der = decode_key_text(text)?;
    let secret = SecretKey::from_sec1_der(&der)
        .or_else(|_| SecretKey::from_pkcs8_der(&der))
        .map_err(|e| Error::key(format!("not a P-384 private key: {}", e)))?;
    Ok(SigningKey::from(secret))
}

/// Read and parse a public key file
pub fn load_public_key(path: impl AsRef<Path>) -> Result<VerifyingKey> {
    let path = path.as_ref();
    let text = read_key_file(path)?;
    public_key_from_text(&text).map_err(|e| with_path(path, e))
}

/// Read and parse a private key file
pub fn load_private_key(path: impl AsRef<Path>) -> Result<SigningKey> {
    let path = path.as_ref();
    let text = read_key_file(path)?;
    private_key_from_text(&text).map_err(|e| with_path(path, e))
}

fn read_key_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::key(format!("failed to read key file {}: {}", path.display(), e)))
}

fn with_path(path: &Path, err: Error) -> Error {
    match err {
        Error::Key(msg) => Error::key(format!("{}: {}", path.display(), msg)),
        other => other,
    }
}
