// # Update Action Trait
//
// The downstream reconfiguration performed when the reported address changes
// (rewrite DNS records, firewall rules, tunnel endpoints, ...).
//
// The reconciler passes addresses with any `:port` suffix already removed.

use async_trait::async_trait;

/// Trait for update action implementations
///
/// An action is invoked at most once per observed address transition and is
/// never retried by the caller. Returning `Err` aborts the transition: the
/// cached address stays at `old`, so the next report from the peer triggers
/// the same `old -> new` call again.
#[async_trait]
pub trait UpdateAction: Send + Sync {
    /// Apply the transition from `old` to `new`
    async fn apply(&self, old: &str, new: &str) -> Result<(), crate::Error>;

    /// Human-readable name for logs
    fn name(&self) -> String;
}
