//! Test doubles and common utilities for contract tests

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ipsync_core::error::{Error, Result};
use ipsync_core::traits::{AddressStore, UpdateAction};
use p384::SecretKey;
use p384::pkcs8::EncodePublicKey;
use rand::rngs::OsRng;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An UpdateAction that records every call
#[derive(Clone, Default)]
pub struct RecordingAction {
    /// Every (old, new) pair, in call order
    calls: Arc<Mutex<Vec<(String, String)>>>,
    /// Number of calls currently running
    in_flight: Arc<AtomicUsize>,
    /// Highest `in_flight` value seen
    max_in_flight: Arc<AtomicUsize>,
    /// Time each call takes
    delay: Duration,
    /// Whether calls fail
    fail: Arc<AtomicBool>,
}

impl RecordingAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call sleeps for `delay` before returning
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Make subsequent calls fail (or succeed again)
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of overlapping calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl UpdateAction for RecordingAction {
    async fn apply(&self, old: &str, new: &str) -> Result<()> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        self.calls
            .lock()
            .unwrap()
            .push((old.to_string(), new.to_string()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::action("exit status 1"));
        }
        Ok(())
    }

    fn name(&self) -> String {
        "recording".to_string()
    }
}

/// An AddressStore that tracks calls and can be told to fail writes
#[derive(Clone)]
pub struct MockAddressStore {
    value: Arc<Mutex<String>>,
    store_call_count: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MockAddressStore {
    pub fn new(initial: &str) -> Self {
        Self {
            value: Arc::new(Mutex::new(initial.to_string())),
            store_call_count: Arc::new(AtomicUsize::new(0)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn value(&self) -> String {
        self.value.lock().unwrap().clone()
    }

    pub fn store_call_count(&self) -> usize {
        self.store_call_count.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl AddressStore for MockAddressStore {
    async fn load(&self) -> Result<String> {
        Ok(self.value())
    }

    async fn store(&self, address: &str) -> Result<()> {
        self.store_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::address_store("disk full"));
        }
        *self.value.lock().unwrap() = address.to_string();
        Ok(())
    }
}

/// Wrap base64 in PEM marker lines, 64 characters per line
pub fn pem(label: &str, der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut out = format!("-----BEGIN {}-----\n", label);
    for chunk in body.as_bytes().chunks(64) {
        out.push_str(std::str::from_utf8(chunk).unwrap());
        out.push('\n');
    }
    out.push_str(&format!("-----END {}-----\n", label));
    out
}

/// Write a fresh key pair as `private.pem` (SEC1) and `public.pem` (SPKI)
pub fn write_key_pair(dir: &Path) -> (PathBuf, PathBuf) {
    let secret = SecretKey::random(&mut OsRng);
    let private_der = secret.to_sec1_der().unwrap();
    let public_der = secret.public_key().to_public_key_der().unwrap();

    let private_path = dir.join("private.pem");
    let public_path = dir.join("public.pem");
    std::fs::write(&private_path, pem("EC PRIVATE KEY", &private_der)).unwrap();
    std::fs::write(&public_path, pem("PUBLIC KEY", public_der.as_bytes())).unwrap();

    (private_path, public_path)
}
