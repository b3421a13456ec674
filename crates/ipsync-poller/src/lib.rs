// # ipsync-poller
//
// Reporting side: sign a fresh message and send it to the listener's
// `/ping` endpoint. The listener learns the address from the connection
// itself, so the request carries nothing but the `Authentication` header.

use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use ipsync_core::auth::AUTH_HEADER;
use ipsync_core::{Error, Result, Signer};

/// Build the HTTP client used for reports
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

/// Send one signed report
///
/// # Returns
///
/// The listener's status and body. A rejected report comes back as
/// `404` and is not an `Err`; only transport failures are.
pub async fn ping(client: &Client, signer: &Signer, url: &str) -> Result<(StatusCode, String)> {
    let header = signer.authentication_header(Utc::now())?;

    let response = client
        .get(url)
        .header(AUTH_HEADER, header)
        .send()
        .await
        .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

    debug!("Listener answered {}", status);
    Ok((status, body))
}
