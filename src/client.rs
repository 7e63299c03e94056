//! HTTP client for the remote team-chat service.
//!
//! Every operation returns an [`ApiResult`]/[`ApiList`] carrying a success
//! flag, the remote failure reason, and the payload. Transport problems
//! (connection refused, timeouts) surface the same way, so the session can
//! report any failure uniformly and keep running.
//!
//! A 401 response triggers one transparent token refresh and one replay of
//! the request; call sites check [`ApiResult::is_success_or_refreshed`] to
//! treat both plain and refreshed successes as "proceed".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Response, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::dates::DateRange;
use crate::error::{Error, Result};
use crate::observability;
use crate::types::{ApiList, ApiResult, Channel, Identity, Member, Message, PageConfig};

const DEFAULT_API_URL: &str = "https://api.hubbub.dev/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the team-chat service API.
#[derive(Clone, Debug)]
pub struct HubClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: ReqwestClient,
    base_url: String,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    token: Mutex<Option<String>>,
    debug: AtomicBool,
}

struct Exchange {
    response: Response,
    refreshed: bool,
}

impl HubClient {
    /// Create a client for an OAuth app, authorized against the tunnel's
    /// public URL.
    ///
    /// The first request obtains an access token lazily; construction never
    /// touches the network.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Result<Self> {
        Self::with_base_url(client_id, client_secret, redirect_url, DEFAULT_API_URL)
    }

    /// Create a client against a non-default API base URL.
    pub fn with_base_url(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        url::Url::parse(&base_url)
            .map_err(|err| Error::url(format!("invalid API base URL: {base_url}"), Some(err)))?;

        let http = ReqwestClient::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::connection(
                    format!("failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                client_id: client_id.into(),
                client_secret: client_secret.into(),
                redirect_url: redirect_url.into(),
                token: Mutex::new(None),
                debug: AtomicBool::new(false),
            }),
        })
    }

    /// The API base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The public redirect URL the client was authorized against.
    pub fn redirect_url(&self) -> &str {
        &self.inner.redirect_url
    }

    /// Whether request tracing to stderr is on.
    pub fn debug(&self) -> bool {
        self.inner.debug.load(Ordering::Relaxed)
    }

    /// Turn request tracing to stderr on or off.
    pub fn set_debug(&self, on: bool) {
        self.inner.debug.store(on, Ordering::Relaxed);
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    ///////////////////////////////////////// Auth /////////////////////////////////////////

    fn stored_token(&self) -> Option<String> {
        self.inner.token.lock().ok().and_then(|guard| guard.clone())
    }

    async fn ensure_token(&self) -> Result<String> {
        match self.stored_token() {
            Some(token) => Ok(token),
            None => self.refresh_access_token().await,
        }
    }

    /// Obtain a fresh access token from the token endpoint and store it.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the endpoint rejects the app
    /// credentials, or a connection error when it is unreachable.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let url = format!("{}oauth/token", self.inner.base_url);
        let response = self
            .inner
            .http
            .post(&url)
            .basic_auth(&self.inner.client_id, Some(&self.inner.client_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("redirect_uri", self.inner.redirect_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                Error::connection(
                    format!("token endpoint unreachable: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::authentication(format!(
                "token endpoint returned {status}"
            )));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| {
                Error::serialization("failed to decode token response", Some(Box::new(e)))
            })?
            .access_token;

        if let Ok(mut guard) = self.inner.token.lock() {
            *guard = Some(token.clone());
        }
        Ok(token)
    }

    ///////////////////////////////////// Request core /////////////////////////////////////

    async fn send_raw(
        &self,
        method: &Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        token: &str,
    ) -> Result<Response> {
        let url = format!("{}{}", self.inner.base_url, path);
        let mut request = self
            .inner
            .http
            .request(method.clone(), &url)
            .headers(self.default_headers())
            .bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(format!("request to {path} timed out"))
            } else {
                Error::connection(format!("request to {path} failed: {e}"), Some(Box::new(e)))
            }
        })
    }

    /// One request with the transparent re-auth contract: a 401 triggers a
    /// single token refresh and a single replay.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Exchange> {
        observability::CLIENT_REQUESTS.click();
        let token = self.ensure_token().await?;
        let mut refreshed = false;
        let mut response = self
            .send_raw(&method, path, query, body.as_ref(), &token)
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            observability::CLIENT_TOKEN_REFRESHES.click();
            let token = self.refresh_access_token().await?;
            refreshed = true;
            response = self
                .send_raw(&method, path, query, body.as_ref(), &token)
                .await?;
        }

        if self.debug() {
            eprintln!("[hubbub] {} {} -> {}", method, path, response.status());
        }
        Ok(Exchange {
            response,
            refreshed,
        })
    }

    /// Pull a failure reason out of an error response body.
    async fn failure_reason(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        #[derive(Deserialize)]
        struct Failure {
            message: Option<String>,
        }
        serde_json::from_str::<Failure>(&body)
            .ok()
            .and_then(|f| f.message)
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body
                }
            })
    }

    async fn call_item<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> ApiResult<T> {
        match self.execute(method, path, query, body).await {
            Err(err) => {
                observability::CLIENT_REQUEST_ERRORS.click();
                ApiResult::from_error(&err)
            }
            Ok(exchange) => {
                let refreshed = exchange.refreshed;
                let status = exchange.response.status();
                if status.is_success() {
                    match exchange.response.json::<T>().await {
                        Ok(payload) => ApiResult::ok(payload).with_refreshed(refreshed),
                        Err(e) => ApiResult::err(None, format!("failed to decode response: {e}")),
                    }
                } else {
                    observability::CLIENT_REQUEST_ERRORS.click();
                    ApiResult::err(
                        Some(status.as_u16()),
                        Self::failure_reason(exchange.response).await,
                    )
                    .with_refreshed(refreshed)
                }
            }
        }
    }

    async fn call_empty(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> ApiResult<()> {
        match self.execute(method, path, query, body).await {
            Err(err) => {
                observability::CLIENT_REQUEST_ERRORS.click();
                ApiResult::from_error(&err)
            }
            Ok(exchange) => {
                let refreshed = exchange.refreshed;
                let status = exchange.response.status();
                if status.is_success() {
                    ApiResult::ok_empty().with_refreshed(refreshed)
                } else {
                    observability::CLIENT_REQUEST_ERRORS.click();
                    ApiResult::err(
                        Some(status.as_u16()),
                        Self::failure_reason(exchange.response).await,
                    )
                    .with_refreshed(refreshed)
                }
            }
        }
    }

    /// One page of a list endpoint: the array lives under `key` next to an
    /// optional `next_page_token`.
    async fn call_page<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        mut query: Vec<(&str, String)>,
        page_token: Option<String>,
    ) -> ApiResult<(Vec<T>, Option<String>)> {
        if let Some(token) = page_token {
            query.push(("next_page_token", token));
        }
        let raw: ApiResult<Value> = self.call_item(Method::GET, path, &query, None).await;
        let refreshed = raw.refreshed();
        if !raw.is_success() {
            return ApiResult::err(raw.status_code(), raw.error_message()).with_refreshed(refreshed);
        }
        let Some(value) = raw.into_item() else {
            return ApiResult::ok((Vec::new(), None)).with_refreshed(refreshed);
        };
        let items = match value.get(key) {
            Some(array) => match serde_json::from_value::<Vec<T>>(array.clone()) {
                Ok(items) => items,
                Err(e) => {
                    return ApiResult::err(None, format!("failed to decode '{key}' list: {e}"));
                }
            },
            None => Vec::new(),
        };
        let next = value
            .get("next_page_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(String::from);
        ApiResult::ok((items, next)).with_refreshed(refreshed)
    }

    /// Drain a paged list endpoint into one list.
    async fn call_list<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        query: Vec<(&str, String)>,
        page: PageConfig,
    ) -> ApiList<T> {
        let mut items = Vec::new();
        let mut page_token = None;
        let mut refreshed = false;
        loop {
            let mut query = query.clone();
            query.push(("page_size", page.page_size.to_string()));
            let result = self.call_page::<T>(path, key, query, page_token).await;
            refreshed = refreshed || result.refreshed();
            if !result.is_success() {
                return ApiResult::err(result.status_code(), result.error_message())
                    .with_refreshed(refreshed);
            }
            let Some((page_items, next)) = result.into_item() else {
                break;
            };
            items.extend(page_items);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        ApiResult::ok(items).with_refreshed(refreshed)
    }

    //////////////////////////////////////// Identity ////////////////////////////////////////

    /// Fetch the authenticated caller's profile.
    ///
    /// # Errors
    ///
    /// Unlike the chat operations, identity failures escalate as errors:
    /// bootstrap retries them under its bounded-attempt contract.
    pub async fn me(&self) -> Result<Identity> {
        let result: ApiResult<Identity> = self.call_item(Method::GET, "users/me", &[], None).await;
        if result.is_success_or_refreshed() {
            result
                .into_item()
                .ok_or_else(|| Error::serialization("identity response had no payload", None))
        } else {
            Err(Error::api(
                result.status_code().unwrap_or(0),
                result.error_message(),
                None,
            ))
        }
    }

    //////////////////////////////////////// Channels ////////////////////////////////////////

    /// List the caller's channels.
    pub async fn list_channels(&self) -> ApiList<Channel> {
        self.call_list(
            "chat/channels",
            "channels",
            Vec::new(),
            PageConfig::default(),
        )
        .await
    }

    /// Create a channel, optionally inviting members by email.
    pub async fn create_channel(&self, name: &str, member_emails: &[String]) -> ApiResult<Channel> {
        let members: Vec<Value> = member_emails.iter().map(|e| json!({ "email": e })).collect();
        self.call_item(
            Method::POST,
            "chat/channels",
            &[],
            Some(json!({ "name": name, "members": members })),
        )
        .await
    }

    /// Fetch one channel by id.
    pub async fn get_channel(&self, channel_id: &str) -> ApiResult<Channel> {
        self.call_item(
            Method::GET,
            &format!("chat/channels/{channel_id}"),
            &[],
            None,
        )
        .await
    }

    /// Rename a channel.
    pub async fn rename_channel(&self, channel_id: &str, name: &str) -> ApiResult<()> {
        self.call_empty(
            Method::PATCH,
            &format!("chat/channels/{channel_id}"),
            &[],
            Some(json!({ "name": name })),
        )
        .await
    }

    /// Delete a channel.
    pub async fn delete_channel(&self, channel_id: &str) -> ApiResult<()> {
        self.call_empty(
            Method::DELETE,
            &format!("chat/channels/{channel_id}"),
            &[],
            None,
        )
        .await
    }

    /// Join a channel as the caller.
    pub async fn join_channel(&self, channel_id: &str) -> ApiResult<()> {
        self.call_empty(
            Method::POST,
            &format!("chat/channels/{channel_id}/members/me"),
            &[],
            None,
        )
        .await
    }

    /// Leave a channel as the caller.
    pub async fn leave_channel(&self, channel_id: &str) -> ApiResult<()> {
        self.call_empty(
            Method::DELETE,
            &format!("chat/channels/{channel_id}/members/me"),
            &[],
            None,
        )
        .await
    }

    //////////////////////////////////////// Members ////////////////////////////////////////

    /// List a channel's members, draining every page.
    pub async fn list_members(&self, channel_id: &str, page: PageConfig) -> ApiList<Member> {
        self.call_list(
            &format!("chat/channels/{channel_id}/members"),
            "members",
            Vec::new(),
            page,
        )
        .await
    }

    /// Invite members to a channel by email.
    pub async fn invite_members(&self, channel_id: &str, emails: &[String]) -> ApiResult<()> {
        let members: Vec<Value> = emails.iter().map(|e| json!({ "email": e })).collect();
        self.call_empty(
            Method::POST,
            &format!("chat/channels/{channel_id}/members"),
            &[],
            Some(json!({ "members": members })),
        )
        .await
    }

    /// Remove a member from a channel.
    pub async fn remove_member(&self, channel_id: &str, member_id: &str) -> ApiResult<()> {
        self.call_empty(
            Method::DELETE,
            &format!("chat/channels/{channel_id}/members/{member_id}"),
            &[],
            None,
        )
        .await
    }

    //////////////////////////////////////// Messages ////////////////////////////////////////

    /// Send a message to a channel; the payload is the new message id.
    pub async fn send_message(&self, channel_id: &str, text: &str) -> ApiResult<String> {
        #[derive(Deserialize)]
        struct MessageId {
            id: String,
        }
        let result: ApiResult<MessageId> = self
            .call_item(
                Method::POST,
                "chat/users/me/messages",
                &[],
                Some(json!({ "message": text, "to_channel": channel_id })),
            )
            .await;
        let refreshed = result.refreshed();
        if result.is_success() {
            match result.into_item() {
                Some(payload) => ApiResult::ok(payload.id).with_refreshed(refreshed),
                None => ApiResult::err(None, "send response had no payload"),
            }
        } else {
            ApiResult::err(result.status_code(), result.error_message()).with_refreshed(refreshed)
        }
    }

    /// List a channel's messages, newest page first, optionally bounded to a
    /// date range (local-time calendar days).
    pub async fn list_messages(
        &self,
        channel_id: &str,
        range: Option<&DateRange>,
    ) -> ApiList<Message> {
        let mut query = vec![("to_channel", channel_id.to_string())];
        if let Some(range) = range {
            query.push(("from", range.from.to_string()));
            query.push(("to", range.to.to_string()));
        }
        self.call_list(
            "chat/users/me/messages",
            "messages",
            query,
            PageConfig::max(),
        )
        .await
    }

    /// Replace a message's body.
    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        text: &str,
    ) -> ApiResult<()> {
        self.call_empty(
            Method::PUT,
            &format!("chat/users/me/messages/{message_id}"),
            &[],
            Some(json!({ "message": text, "to_channel": channel_id })),
        )
        .await
    }

    /// Delete a message.
    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> ApiResult<()> {
        self.call_empty(
            Method::DELETE,
            &format!("chat/users/me/messages/{message_id}"),
            &[("to_channel", channel_id.to_string())],
            None,
        )
        .await
    }

    //////////////////////////////////////// Contacts ////////////////////////////////////////

    /// List the caller's external contacts.
    pub async fn list_external_contacts(&self) -> ApiList<Member> {
        self.call_list(
            "chat/users/me/contacts",
            "contacts",
            vec![("type", "external".to_string())],
            PageConfig::default(),
        )
        .await
    }

    ////////////////////////////////// By-name conveniences //////////////////////////////////

    /// Resolve a channel by display name.
    pub async fn find_channel(&self, name: &str) -> ApiResult<Channel> {
        let channels = self.list_channels().await;
        let refreshed = channels.refreshed();
        if !channels.is_success() {
            return ApiResult::err(channels.status_code(), channels.error_message())
                .with_refreshed(refreshed);
        }
        match channels.into_items().into_iter().find(|c| c.name == name) {
            Some(channel) => ApiResult::ok(channel).with_refreshed(refreshed),
            None => ApiResult::err(Some(404), format!("no channel named '{name}'")),
        }
    }

    /// Message history for a channel name over a date range.
    pub async fn history(&self, channel_name: &str, range: &DateRange) -> ApiList<Message> {
        let channel = self.find_channel(channel_name).await;
        if !channel.is_success_or_refreshed() {
            return ApiResult::err(channel.status_code(), channel.error_message());
        }
        match channel.into_item() {
            Some(channel) => self.list_messages(&channel.id, Some(range)).await,
            None => ApiResult::err(None, "channel lookup had no payload"),
        }
    }

    /// History filtered by a caller-supplied predicate.
    pub async fn search<F>(
        &self,
        channel_name: &str,
        range: &DateRange,
        predicate: F,
    ) -> ApiList<Message>
    where
        F: Fn(&Message) -> bool,
    {
        let result = self.history(channel_name, range).await;
        let refreshed = result.refreshed();
        if !result.is_success() {
            return result;
        }
        let matched = result.into_items().into_iter().filter(|m| predicate(m)).collect();
        ApiResult::ok(matched).with_refreshed(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HubClient {
        HubClient::new("id", "secret", "https://example.ngrok.io").unwrap()
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let c = HubClient::with_base_url("id", "secret", "https://r", "https://api.example.com/v1")
            .unwrap();
        assert_eq!(c.base_url(), "https://api.example.com/v1/");
    }

    #[test]
    fn invalid_base_url_rejected() {
        let err =
            HubClient::with_base_url("id", "secret", "https://r", "not a url").unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn debug_flag_toggles() {
        let c = client();
        assert!(!c.debug());
        c.set_debug(true);
        assert!(c.debug());
        // Clones share the flag.
        let c2 = c.clone();
        c2.set_debug(false);
        assert!(!c.debug());
    }

    #[tokio::test]
    async fn unreachable_host_is_failure_data_not_panic() {
        let c = HubClient::with_base_url("id", "secret", "https://r", "http://127.0.0.1:9/")
            .unwrap();
        let result = c.list_channels().await;
        assert!(!result.is_success_or_refreshed());
        assert!(result.items().is_empty());
    }
}
