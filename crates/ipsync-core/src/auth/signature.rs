//! Signature transport encoding
//!
//! On the wire a signature is `base64(R || S)` with R and S as big-endian
//! integers. Decoding splits the bytes exactly in half, so both halves must
//! have the same length. The encoder always writes R and S at the full
//! 48-byte scalar width, which satisfies that; decoders that drop leading
//! zeros still read the same integers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use p384::ecdsa::Signature;
use p384::FieldBytes;

use super::verifier::AuthError;

/// Width of one P-384 scalar in bytes
pub const SCALAR_LEN: usize = 48;

/// Encode a signature as `base64(R || S)` with fixed-width scalars
pub fn encode_signature(signature: &Signature) -> String {
    STANDARD.encode(signature.to_bytes())
}

/// Decode `base64(R || S)` by halving the decoded bytes
pub fn decode_signature(encoded: &str) -> Result<Signature, AuthError> {
    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|_| AuthError::InvalidBase64)?;

    let (r, s) = bytes.split_at(bytes.len() / 2);
    let r = scalar_bytes(r)?;
    let s = scalar_bytes(s)?;

    Signature::from_scalars(r, s).map_err(|_| AuthError::MalformedSignature)
}

/// Left-pad a big-endian integer to the scalar width
fn scalar_bytes(be: &[u8]) -> Result<FieldBytes, AuthError> {
    let start = be.iter().position(|&b| b != 0).unwrap_or(be.len());
    let digits = &be[start..];
    if digits.is_empty() || digits.len() > SCALAR_LEN {
        return Err(AuthError::MalformedSignature);
    }

    let mut out = FieldBytes::default();
    out[SCALAR_LEN - digits.len()..].copy_from_slice(digits);
    Ok(out)
}
