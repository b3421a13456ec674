//! Reporting-side signing

use chrono::{DateTime, Utc};
use p384::ecdsa::signature::hazmat::PrehashSigner;
use p384::ecdsa::{Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha512};
use std::path::Path;

use super::keys;
use super::message::AuthenticatedMessage;
use super::signature::encode_signature;
use crate::{Error, Result};

/// Signs authenticated messages with the reporting peer's private key
#[derive(Clone)]
pub struct Signer {
    key: SigningKey,
}

impl Signer {
    /// Create a signer from a private key
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Load the private key from a base64/PEM file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(keys::load_private_key(path)?))
    }

    /// The public key matching this signer
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey::from(&self.key)
    }

    /// Sign the SHA-512 hash of `message`, returning the base64 signature
    pub fn sign(&self, message: &str) -> Result<String> {
        let digest = Sha512::digest(message.as_bytes());
        let signature: Signature = self
            .key
            .sign_prehash(&digest)
            .map_err(|e| Error::signing(format!("ECDSA signing failed: {}", e)))?;
        Ok(encode_signature(&signature))
    }

    /// Build a fresh message for `now` and sign it
    pub fn create_time_signature(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(AuthenticatedMessage, String)> {
        let message = AuthenticatedMessage::new(now)?;
        let signature = self.sign(message.as_str())?;
        Ok((message, signature))
    }

    /// The complete `Authentication` header value for `now`
    pub fn authentication_header(&self, now: DateTime<Utc>) -> Result<String> {
        let (message, signature) = self.create_time_signature(now)?;
        let mut header = message.into_string();
        header.push_str(&signature);
        Ok(header)
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}
