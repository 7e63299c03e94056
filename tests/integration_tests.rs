//! Integration tests for the hubbub client.
//! These tests require a live service and credentials in the environment.

#[cfg(test)]
mod tests {
    use hubbub::HubClient;

    fn client_from_env() -> Option<HubClient> {
        let base = std::env::var("HUBBUB_API_URL").ok()?;
        let client_id = std::env::var("HUBBUB_CLIENT_ID").ok()?;
        let client_secret = std::env::var("HUBBUB_CLIENT_SECRET").ok()?;
        HubClient::with_base_url(
            client_id,
            client_secret,
            "https://localhost/callback",
            base,
        )
        .ok()
    }

    #[tokio::test]
    async fn test_identity_fetch() {
        let Some(client) = client_from_env() else {
            eprintln!("Skipping test: HUBBUB_API_URL / credentials not set");
            return;
        };

        let identity = client.me().await;
        assert!(identity.is_ok(), "Identity fetch should succeed with valid credentials");
    }

    #[tokio::test]
    async fn test_channel_listing() {
        let Some(client) = client_from_env() else {
            eprintln!("Skipping test: HUBBUB_API_URL / credentials not set");
            return;
        };

        let channels = client.list_channels().await;
        assert!(
            channels.is_success_or_refreshed(),
            "Channel listing should succeed: {}",
            channels.error_message()
        );
    }
}
