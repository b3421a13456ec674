// # Address Store Trait
//
// Persistence for the single cached address of a listener.
//
// ## Purpose
//
// The listener keeps the last reconciled address in memory and mirrors it to
// durable storage, so a restart does not re-run the update action for an
// address that was already applied.
//
// ## Implementations
//
// - File-based: plain text file holding exactly the address
// - In-memory: for embedding and tests

use async_trait::async_trait;

/// Trait for address store implementations
///
/// # Thread Safety
///
/// Implementations must be safe to share across tasks. Callers serialise
/// writes themselves (the `Reconciler` holds its lock across `store`), so
/// implementations need no ordering guarantees beyond durability.
///
/// # Durability
///
/// `store` must not return `Ok` until the new value would survive a crash.
/// A failed `store` must leave the previously stored value readable.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Read the stored address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: the stored address, surrounding whitespace removed
    /// - `Err(Error)`: storage error
    async fn load(&self) -> Result<String, crate::Error>;

    /// Replace the stored address
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the new address is durable
    /// - `Err(Error)`: storage error, old value intact
    async fn store(&self, address: &str) -> Result<(), crate::Error>;
}
