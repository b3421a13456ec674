//! Address reconciliation
//!
//! The Reconciler owns the listener's last known address and drives the
//! compare → update action → persist sequence when a verified report carries
//! a different address.
//!
//! ## Flow
//!
//! ```text
//!   observed ──► lock ──► equal? ──yes──► Unchanged
//!                           │
//!                           no
//!                           ▼
//!               action(old w/o port, new w/o port) ──err──► Err (state untouched)
//!                           │
//!                           ▼
//!               store(observed) ──err──► Err (memory untouched)
//!                           │
//!                           ▼
//!               memory = observed ──► Updated
//! ```
//!
//! The lock is held across all three steps. Two reports racing with different
//! addresses are applied one after the other, and each action sees the
//! address the previous one installed as its `old` value.

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::traits::{AddressStore, UpdateAction};

/// Result of reconciling one observed address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The observed address already matched
    Unchanged {
        /// The current address
        address: String,
    },
    /// The action ran and the new address was persisted
    Updated {
        /// The address replaced
        previous: String,
        /// The address now cached
        current: String,
    },
}

impl ReconcileOutcome {
    /// The address the listener holds after reconciliation
    pub fn address(&self) -> &str {
        match self {
            ReconcileOutcome::Unchanged { address } => address,
            ReconcileOutcome::Updated { current, .. } => current,
        }
    }
}

/// Holds the last known address and applies changes to it
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`], which loads the stored address
/// 2. Share behind an `Arc` between request handlers
/// 3. Call [`Reconciler::reconcile()`] with each verified observed address
pub struct Reconciler {
    /// In-memory mirror of the stored address; the mutex spans the whole
    /// reconciliation
    last_known: Mutex<String>,

    /// Durable copy of the address
    store: Box<dyn AddressStore>,

    /// Action run on every transition
    action: Box<dyn UpdateAction>,
}

impl Reconciler {
    /// Create a reconciler seeded from the store's current value
    pub async fn new(
        store: Box<dyn AddressStore>,
        action: Box<dyn UpdateAction>,
    ) -> Result<Self> {
        let initial = store.load().await?;
        info!("Last known address: {:?}", initial);
        Ok(Self::with_initial(initial, store, action))
    }

    /// Create a reconciler with an explicit starting address
    pub fn with_initial(
        initial: impl Into<String>,
        store: Box<dyn AddressStore>,
        action: Box<dyn UpdateAction>,
    ) -> Self {
        Self {
            last_known: Mutex::new(initial.into()),
            store,
            action,
        }
    }

    /// Snapshot of the last known address
    ///
    /// Only for reporting; deciding on a change must go through
    /// [`Reconciler::reconcile()`].
    pub async fn last_known(&self) -> String {
        self.last_known.lock().await.clone()
    }

    /// Reconcile an observed `ip:port` address
    ///
    /// # Returns
    ///
    /// - `Ok(Unchanged)`: observed equals the cached address; nothing ran
    /// - `Ok(Updated)`: action succeeded and the address was persisted
    /// - `Err(Error)`: action or persistence failed; cached address unchanged
    pub async fn reconcile(&self, observed: &str) -> Result<ReconcileOutcome> {
        let mut last_known = self.last_known.lock().await;

        if *last_known == observed {
            debug!("Address {} unchanged, skipping update", observed);
            return Ok(ReconcileOutcome::Unchanged {
                address: observed.to_string(),
            });
        }

        let old_host = strip_port(&last_known);
        let new_host = strip_port(observed);
        info!(
            "Address changed {} -> {}, running {}",
            last_known,
            observed,
            self.action.name()
        );

        if let Err(e) = self.action.apply(old_host, new_host).await {
            error!("Update action failed for {} -> {}: {}", old_host, new_host, e);
            return Err(e);
        }

        if let Err(e) = self.store.store(observed).await {
            error!("Failed to persist address {}: {}", observed, e);
            return Err(e);
        }

        let previous = std::mem::replace(&mut *last_known, observed.to_string());
        info!("Updated {} -> {}", previous, observed);

        Ok(ReconcileOutcome::Updated {
            previous,
            current: observed.to_string(),
        })
    }
}

/// Drop a trailing `:port`, splitting on the last `:`
///
/// Addresses without a `:` are returned whole. IPv6 literals keep their
/// brackets (`[2001:db8::1]:443` becomes `[2001:db8::1]`).
pub fn strip_port(address: &str) -> &str {
    match address.rfind(':') {
        Some(index) => &address[..index],
        None => address,
    }
}
