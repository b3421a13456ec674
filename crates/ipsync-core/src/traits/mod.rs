//! Core traits for ipsync
//!
//! - [`AddressStore`]: persistence of the last known address
//! - [`UpdateAction`]: the external action run when the address changes

pub mod address_store;
pub mod update_action;

pub use address_store::AddressStore;
pub use update_action::UpdateAction;
