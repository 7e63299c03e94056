//! Two-phase session bootstrap: tunnel first, identity second.
//!
//! Before any session begins, the config is read, the tunnel provider
//! exposes the callback port publicly, an authorized client is constructed
//! against the tunnel's public URL, and the caller's identity is fetched
//! under a bounded-attempt contract. A second consecutive identity failure
//! is terminal: the error propagates to the binary, which exits non-zero.

use std::path::Path;

use crate::client::HubClient;
use crate::config::OAuthConfig;
use crate::error::Result;
use crate::observability;
use crate::retry;
use crate::tunnel::TunnelProvider;
use crate::types::Identity;

/// How many identity-fetch attempts bootstrap makes in total.
pub const IDENTITY_ATTEMPTS: u32 = 2;

/// Run the bootstrap sequence and hand back the client and identity.
///
/// # Errors
///
/// Config, tunnel, and client-construction failures propagate directly.
/// Identity failures are retried once; the second failure is returned as-is
/// and is not recoverable by the caller.
pub async fn run(
    config_path: impl AsRef<Path>,
    tunnel: &dyn TunnelProvider,
) -> Result<(HubClient, Identity)> {
    let config = OAuthConfig::load(config_path)?;
    let public_url = tunnel.open(config.port).await?;
    let client = match &config.api_url {
        Some(api_url) => HubClient::with_base_url(
            config.client_id.clone(),
            config.client_secret.clone(),
            public_url,
            api_url,
        )?,
        None => HubClient::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            public_url,
        )?,
    };
    let identity = fetch_identity(&client).await?;
    Ok((client, identity))
}

/// Fetch the caller's identity with at most [`IDENTITY_ATTEMPTS`] attempts.
///
/// Each failure prints its reason; success on either attempt is identical
/// downstream. No backoff is inserted.
pub async fn fetch_identity(client: &HubClient) -> Result<Identity> {
    retry::with_attempts(
        IDENTITY_ATTEMPTS,
        || client.me(),
        |attempt, err| {
            println!("Failed to fetch your identity.\nReason: {err}");
            if attempt < IDENTITY_ATTEMPTS {
                observability::BOOTSTRAP_RETRIES.click();
                println!("Retrying...");
            }
        },
    )
    .await
}
