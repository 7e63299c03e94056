//! Public-URL tunnel provisioning for OAuth callback delivery.
//!
//! The service delivers the OAuth callback over the public internet, so the
//! local callback port has to be reachable from outside. [`TunnelProvider`]
//! is the seam; [`NgrokTunnel`] adapts the ngrok agent by spawning it
//! against the port and reading the public URL back from the agent's local
//! control API.

use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_CONTROL_URL: &str = "http://127.0.0.1:4040";
const READINESS_ATTEMPTS: u32 = 20;
const READINESS_DELAY: Duration = Duration::from_millis(500);

/// Provider of a public forwarding URL for a local port.
#[async_trait::async_trait]
pub trait TunnelProvider: Send + Sync {
    /// Expose `port` publicly and return the public URL.
    async fn open(&self, port: u16) -> Result<String>;
}

/// Tunnel provider backed by a locally installed ngrok agent.
pub struct NgrokTunnel {
    control_url: String,
    child: Mutex<Option<Child>>,
}

impl NgrokTunnel {
    /// Create a provider that talks to the agent's default control API.
    pub fn new() -> Self {
        Self::with_control_url(DEFAULT_CONTROL_URL)
    }

    /// Create a provider against a non-default agent control URL.
    pub fn with_control_url(control_url: impl Into<String>) -> Self {
        Self {
            control_url: control_url.into(),
            child: Mutex::new(None),
        }
    }

    fn spawn_agent(&self, port: u16) -> Result<()> {
        let child = Command::new("ngrok")
            .args(["http", &port.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| {
                Error::tunnel(format!(
                    "failed to start the ngrok agent (is ngrok installed?): {err}"
                ))
            })?;
        if let Ok(mut guard) = self.child.lock() {
            *guard = Some(child);
        }
        Ok(())
    }
}

impl Default for NgrokTunnel {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NgrokTunnel {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.child.lock()
            && let Some(mut child) = guard.take()
        {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[async_trait::async_trait]
impl TunnelProvider for NgrokTunnel {
    async fn open(&self, port: u16) -> Result<String> {
        self.spawn_agent(port)?;

        let client = reqwest::Client::new();
        let tunnels_url = format!("{}/api/tunnels", self.control_url);
        for _ in 0..READINESS_ATTEMPTS {
            tokio::time::sleep(READINESS_DELAY).await;
            let Ok(response) = client.get(&tunnels_url).send().await else {
                continue;
            };
            let Ok(listing) = response.json::<AgentTunnels>().await else {
                continue;
            };
            if let Some(url) = select_public_url(&listing, port) {
                return Ok(url);
            }
        }
        Err(Error::tunnel(format!(
            "the ngrok agent never reported a tunnel for port {port}"
        )))
    }
}

#[derive(Debug, Deserialize)]
struct AgentTunnels {
    tunnels: Vec<AgentTunnel>,
}

#[derive(Debug, Deserialize)]
struct AgentTunnel {
    public_url: String,
    #[serde(default)]
    proto: String,
    config: AgentTunnelConfig,
}

#[derive(Debug, Deserialize)]
struct AgentTunnelConfig {
    addr: String,
}

/// Pick the public URL for the tunnel bound to `port`, preferring https.
fn select_public_url(listing: &AgentTunnels, port: u16) -> Option<String> {
    let suffix = format!(":{port}");
    let bound = |t: &&AgentTunnel| t.config.addr.ends_with(&suffix);
    listing
        .tunnels
        .iter()
        .filter(bound)
        .find(|t| t.proto == "https")
        .or_else(|| listing.tunnels.iter().find(bound))
        .map(|t| t.public_url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(json: &str) -> AgentTunnels {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn selects_https_tunnel_for_port() {
        let listing = listing(
            r#"{"tunnels": [
                {"public_url": "http://x.ngrok.io", "proto": "http",
                 "config": {"addr": "http://localhost:8080"}},
                {"public_url": "https://x.ngrok.io", "proto": "https",
                 "config": {"addr": "http://localhost:8080"}}
            ]}"#,
        );
        assert_eq!(
            select_public_url(&listing, 8080),
            Some("https://x.ngrok.io".to_string())
        );
    }

    #[test]
    fn ignores_tunnels_for_other_ports() {
        let listing = listing(
            r#"{"tunnels": [
                {"public_url": "https://y.ngrok.io", "proto": "https",
                 "config": {"addr": "http://localhost:9999"}}
            ]}"#,
        );
        assert_eq!(select_public_url(&listing, 8080), None);
    }

    #[test]
    fn falls_back_to_any_proto() {
        let listing = listing(
            r#"{"tunnels": [
                {"public_url": "tcp://z.ngrok.io:1234", "proto": "tcp",
                 "config": {"addr": "localhost:8080"}}
            ]}"#,
        );
        assert_eq!(
            select_public_url(&listing, 8080),
            Some("tcp://z.ngrok.io:1234".to_string())
        );
    }

    #[test]
    fn empty_listing_yields_none() {
        let listing = listing(r#"{"tunnels": []}"#);
        assert_eq!(select_public_url(&listing, 8080), None);
    }
}
