//! Authenticated-freshness protocol
//!
//! A report is authenticated by an `Authentication` header holding a
//! 50-character message followed by a base64 ECDSA signature:
//!
//! ```text
//! 20250109T120000Xq3-...(35 random chars)...k9bQ...(128 chars)...
//! └── timestamp ─┘└──────── nonce ─────────┘└──── signature ────┘
//! └─────────────── message (50) ───────────┘
//! ```
//!
//! - [`Signer`]: builds messages and signs them (reporting peer)
//! - [`Verifier`]: checks freshness and signature (receiving peer)
//! - [`keys`]: loads key material from base64/PEM text

pub mod keys;
pub mod message;
pub mod signature;
pub mod signer;
pub mod verifier;

pub use message::{AuthenticatedMessage, MESSAGE_LEN, TIMESTAMP_LEN};
pub use signer::Signer;
pub use verifier::{AuthError, FRESHNESS_WINDOW_SECS, MAX_HEADER_LEN, MIN_HEADER_LEN, Verifier};

/// Name of the HTTP header carrying the message and signature
pub const AUTH_HEADER: &str = "Authentication";
