//! Configuration-file loading.
//!
//! The client is configured by an INI file (default `bot.ini` in the working
//! directory) whose `[OAuth]` section carries the app credentials and the
//! local port the OAuth callback listener binds to.

use std::path::Path;

use ini::Ini;

use crate::error::{Error, Result};

/// Config path used when the command line does not name one.
pub const DEFAULT_CONFIG_PATH: &str = "bot.ini";

const SECTION_OAUTH: &str = "OAuth";
const KEY_CLIENT_ID: &str = "client_id";
const KEY_CLIENT_SECRET: &str = "client_secret";
const KEY_PORT: &str = "port";
const KEY_API_URL: &str = "api_url";

/// Credentials and callback port read from the `[OAuth]` config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    /// OAuth application client ID.
    pub client_id: String,

    /// OAuth application client secret.
    pub client_secret: String,

    /// Local port the callback listener and the tunnel bind to.
    pub port: u16,

    /// Optional API base URL override; the client's default is used when
    /// absent.
    pub api_url: Option<String>,
}

impl OAuthConfig {
    /// Load the configuration from an INI file.
    ///
    /// # Errors
    ///
    /// Returns a config error when the file cannot be read or parsed, when
    /// the `[OAuth]` section is absent, or when any key is missing or (for
    /// `port`) not an integer in range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|err| {
            Error::config(
                format!("failed to read {}: {}", path.display(), err),
                None,
            )
        })?;

        let section = ini.section(Some(SECTION_OAUTH)).ok_or_else(|| {
            Error::config(
                format!("missing [{SECTION_OAUTH}] section in {}", path.display()),
                None,
            )
        })?;

        let get = |key: &str| -> Result<&str> {
            section
                .get(key)
                .ok_or_else(|| Error::config("missing key", Some(key.to_string())))
        };

        let client_id = get(KEY_CLIENT_ID)?.to_string();
        let client_secret = get(KEY_CLIENT_SECRET)?.to_string();
        let port = get(KEY_PORT)?.parse::<u16>().map_err(|_| {
            Error::config(
                "port must be an integer in [0, 65535]",
                Some(KEY_PORT.to_string()),
            )
        })?;

        let api_url = section.get(KEY_API_URL).map(String::from);

        Ok(Self {
            client_id,
            client_secret,
            port,
            api_url,
        })
    }
}
