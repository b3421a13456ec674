// # Memory Address Store
//
// In-memory implementation of AddressStore.
//
// Nothing survives a restart, so the first report after a restart always
// runs the update action. Useful for tests and for embedding the reconciler
// where the caller owns persistence.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::address_store::AddressStore;

/// In-memory address store
///
/// Clones share the same value and write counter.
#[derive(Debug, Clone, Default)]
pub struct MemoryAddressStore {
    inner: Arc<RwLock<String>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryAddressStore {
    /// Create a store holding `address`
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(address.into())),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Current stored value
    pub async fn current(&self) -> String {
        self.inner.read().await.clone()
    }

    /// Number of successful `store` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressStore for MemoryAddressStore {
    async fn load(&self) -> Result<String, Error> {
        Ok(self.inner.read().await.trim().to_string())
    }

    async fn store(&self, address: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        *guard = address.to_string();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
