//! Shared fixtures for listener tests

#![allow(dead_code)]

use async_trait::async_trait;
use ipsync_core::error::{Error, Result};
use ipsync_core::{MemoryAddressStore, Reconciler, Signer, UpdateAction, Verifier};
use ipsync_listener::AppState;
use p384::ecdsa::SigningKey;
use rand::rngs::OsRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// An UpdateAction that records calls and can be told to fail
#[derive(Clone, Default)]
pub struct RecordingAction {
    calls: Arc<Mutex<Vec<(String, String)>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingAction {
    pub fn failing() -> Self {
        let action = Self::default();
        action.fail.store(true, Ordering::SeqCst);
        action
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpdateAction for RecordingAction {
    async fn apply(&self, old: &str, new: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((old.to_string(), new.to_string()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::action("update-firewall.sh exited with exit status: 3: table locked"));
        }
        Ok(())
    }

    fn name(&self) -> String {
        "recording".to_string()
    }
}

/// A fresh signing key pair
pub fn key_pair() -> (Signer, Verifier) {
    let signer = Signer::new(SigningKey::random(&mut OsRng));
    let verifier = Verifier::new(signer.verifying_key());
    (signer, verifier)
}

/// Listener state over an in-memory store
pub struct Fixture {
    pub signer: Signer,
    pub store: MemoryAddressStore,
    pub action: RecordingAction,
    pub state: Arc<AppState>,
}

impl Fixture {
    pub fn new(initial: &str, action: RecordingAction) -> Self {
        let (signer, verifier) = key_pair();
        let store = MemoryAddressStore::new(initial);
        let reconciler = Reconciler::with_initial(
            initial,
            Box::new(store.clone()),
            Box::new(action.clone()),
        );

        Self {
            signer,
            store,
            action,
            state: Arc::new(AppState::new(verifier, reconciler)),
        }
    }

    /// A header valid right now
    pub fn header(&self) -> String {
        self.signer.authentication_header(chrono::Utc::now()).unwrap()
    }
}
