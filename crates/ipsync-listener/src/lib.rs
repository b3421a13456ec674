// # ipsync-listener
//
// HTTP surface of the listener. A single `GET /ping` route checks the
// `Authentication` header, then hands the requester's `ip:port` to the
// Reconciler.
//
// | outcome                       | status | body                 |
// |-------------------------------|--------|----------------------|
// | header rejected               | 404    | empty                |
// | action or persistence failed  | 500    | error text           |
// | accepted                      | 200    | requester `ip:port`  |
//
// A rejection looks the same as an unknown route.

use axum::Router;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use ipsync_core::auth::AUTH_HEADER;
use ipsync_core::{
    FileAddressStore, ListenerConfig, Reconciler, Result, ScriptAction, Verifier,
};

/// Shared state of the listener
pub struct AppState {
    /// Checks report headers
    pub verifier: Verifier,

    /// Owns the last known address
    pub reconciler: Reconciler,
}

impl AppState {
    /// Create state from an already loaded verifier and reconciler
    pub fn new(verifier: Verifier, reconciler: Reconciler) -> Self {
        Self {
            verifier,
            reconciler,
        }
    }

    /// Load keys and address file and wire the script action
    pub async fn from_config(config: &ListenerConfig) -> Result<Self> {
        let verifier = Verifier::from_path(&config.public_key)?;
        let store = FileAddressStore::open(&config.address_file).await?;
        let action = ScriptAction::new(&config.update_action);
        let reconciler = Reconciler::new(Box::new(store), Box::new(action)).await?;
        Ok(Self::new(verifier, reconciler))
    }
}

/// Build the listener's router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

async fn ping(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    // Non-ASCII values can never be a valid header
    let values: Option<Vec<&str>> = headers
        .get_all(AUTH_HEADER)
        .iter()
        .map(|value| value.to_str().ok())
        .collect();

    let authenticated = values.is_some_and(|values| state.verifier.verify(&values));
    if !authenticated {
        debug!("Rejected report from {}", remote);
        return StatusCode::NOT_FOUND.into_response();
    }

    // Own task: a client hanging up must not cancel a running action
    let observed = remote.to_string();
    let task = {
        let state = Arc::clone(&state);
        let observed = observed.clone();
        tokio::spawn(async move { state.reconciler.reconcile(&observed).await })
    };

    match task.await {
        Ok(Ok(outcome)) => {
            debug!("Report from {}: {:?}", remote, outcome);
            (StatusCode::OK, observed).into_response()
        }
        Ok(Err(e)) => {
            error!("Reconciliation for {} failed: {}", observed, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            error!("Reconciliation task for {} failed: {}", observed, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
