// # ipsync-core
//
// Core library for ipsync: a roaming host reports its address to a fixed
// listener, which reconciles downstream configuration when it changes.
//
// ## Architecture Overview
//
// - **Signer / Verifier**: the authenticated-freshness protocol. A report
//   carries a timestamped random message and its ECDSA P-384 signature over
//   SHA-512; the verifier accepts it only inside a ±10 minute window.
// - **AddressStore**: trait for persisting the last known address.
// - **UpdateAction**: trait for the external action run on address change.
// - **Reconciler**: compare → invoke action → persist, as one critical section.
//
// ## Design Principles
//
// 1. **Library-First**: the listener and poller binaries are thin wrappers.
// 2. **No Oracle**: authentication failures are a plain boolean to callers.
// 3. **No Partial Updates**: a failed action leaves the cached address alone.

pub mod action;
pub mod auth;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use action::ScriptAction;
pub use auth::{AuthError, AuthenticatedMessage, Signer, Verifier};
pub use config::{ListenerConfig, PollerConfig};
pub use error::{Error, Result};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use state::{FileAddressStore, MemoryAddressStore};
pub use traits::{AddressStore, UpdateAction};
