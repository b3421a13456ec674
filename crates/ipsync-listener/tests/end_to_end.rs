//! End-to-end: real listener and poller over loopback
//!
//! Keys, address file and update action all come from disk, wired the same
//! way the binaries wire them.

use ipsync_core::{ListenerConfig, Signer};
use ipsync_listener::AppState;
use p384::SecretKey;
use p384::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rand::rngs::OsRng;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Write a PKCS#8 private key and SPKI public key, both PEM
fn write_pem_keys(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    let secret = SecretKey::random(&mut OsRng);
    let private_path = dir.join(format!("{}.pem", name));
    let public_path = dir.join(format!("{}.pub", name));

    std::fs::write(
        &private_path,
        secret.to_pkcs8_pem(LineEnding::LF).unwrap().as_bytes(),
    )
    .unwrap();
    std::fs::write(
        &public_path,
        secret.public_key().to_public_key_pem(LineEnding::LF).unwrap(),
    )
    .unwrap();

    (private_path, public_path)
}

struct RunningListener {
    url: String,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<std::io::Result<()>>,
}

impl RunningListener {
    async fn start(config: &ListenerConfig) -> Self {
        let state = Arc::new(AppState::from_config(config).await.unwrap());
        let listener = TcpListener::bind(config.listen_addr().unwrap()).await.unwrap();
        let url = format!("http://{}/ping", listener.local_addr().unwrap());

        let (shutdown, signal) = oneshot::channel::<()>();
        let server = tokio::spawn(ipsync_listener::serve(listener, state, async move {
            let _ = signal.await;
        }));

        Self {
            url,
            shutdown,
            server,
        }
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.server.await.unwrap().unwrap();
    }
}

#[cfg(unix)]
#[tokio::test]
async fn signed_report_runs_action_and_persists() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let (private_key, public_key) = write_pem_keys(dir.path(), "roaming");

    let address_file = dir.path().join("address");
    std::fs::write(&address_file, "203.0.113.5\n").unwrap();

    let log = dir.path().join("calls.log");
    let script = dir.path().join("update.sh");
    std::fs::write(
        &script,
        format!("#!/bin/sh\necho \"$@\" >> '{}'\n", log.display()),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config = ListenerConfig {
        address_file: address_file.clone(),
        update_action: script,
        public_key,
        listen: "127.0.0.1:0".to_string(),
    };
    config.validate().unwrap();
    let running = RunningListener::start(&config).await;

    let signer = Signer::from_path(&private_key).unwrap();
    let client = ipsync_poller::build_client(Duration::from_secs(5)).unwrap();

    let (status, body) = ipsync_poller::ping(&client, &signer, &running.url)
        .await
        .unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("127.0.0.1:"), "body was {:?}", body);
    assert_eq!(std::fs::read_to_string(&address_file).unwrap(), body);
    assert_eq!(
        std::fs::read_to_string(&log).unwrap().trim(),
        "--old=203.0.113.5 --new=127.0.0.1"
    );

    // Unsigned requests look like a missing route
    let response = client.get(&running.url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "");

    drop(client);
    running.stop().await;
}

#[cfg(unix)]
#[tokio::test]
async fn client_hanging_up_does_not_cancel_update() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let (private_key, public_key) = write_pem_keys(dir.path(), "roaming");

    let address_file = dir.path().join("address");
    std::fs::write(&address_file, "203.0.113.5\n").unwrap();

    // Action outlives the client's timeout
    let log = dir.path().join("calls.log");
    let script = dir.path().join("update.sh");
    std::fs::write(
        &script,
        format!("#!/bin/sh\nsleep 2\necho \"$@\" >> '{}'\n", log.display()),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config = ListenerConfig {
        address_file: address_file.clone(),
        update_action: script,
        public_key,
        listen: "127.0.0.1:0".to_string(),
    };
    let running = RunningListener::start(&config).await;

    let signer = Signer::from_path(&private_key).unwrap();
    let client = ipsync_poller::build_client(Duration::from_millis(500)).unwrap();

    assert!(ipsync_poller::ping(&client, &signer, &running.url).await.is_err());
    drop(client);

    let mut persisted = String::new();
    for _ in 0..50 {
        persisted = std::fs::read_to_string(&address_file).unwrap();
        if persisted.starts_with("127.0.0.1:") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    assert!(persisted.starts_with("127.0.0.1:"), "address file was {:?}", persisted);
    assert_eq!(
        std::fs::read_to_string(&log).unwrap().trim(),
        "--old=203.0.113.5 --new=127.0.0.1"
    );

    running.stop().await;
}

#[tokio::test]
async fn report_signed_with_other_key_is_rejected() {
    let dir = tempdir().unwrap();
    let (_, public_key) = write_pem_keys(dir.path(), "trusted");
    let (intruder_key, _) = write_pem_keys(dir.path(), "intruder");

    let address_file = dir.path().join("address");
    std::fs::write(&address_file, "203.0.113.5").unwrap();

    let config = ListenerConfig {
        address_file: address_file.clone(),
        update_action: dir.path().join("never-run.sh"),
        public_key,
        listen: "127.0.0.1:0".to_string(),
    };
    let running = RunningListener::start(&config).await;

    let signer = Signer::from_path(&intruder_key).unwrap();
    let client = ipsync_poller::build_client(Duration::from_secs(5)).unwrap();

    let (status, body) = ipsync_poller::ping(&client, &signer, &running.url)
        .await
        .unwrap();

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "");
    assert_eq!(std::fs::read_to_string(&address_file).unwrap(), "203.0.113.5");

    drop(client);
    running.stop().await;
}
