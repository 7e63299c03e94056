use crate::error::Error;

/// Outcome of one remote call: a success flag, an error message, and a
/// payload (single item or item list).
///
/// Remote business failures are data, not [`Err`]: an action that the
/// service rejects comes back as an unsuccessful `ApiResult` carrying the
/// formatted reason, and the session decides how to present it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult<T> {
    success: bool,
    status_code: Option<u16>,
    error_message: Option<String>,
    refreshed: bool,
    payload: Option<T>,
}

/// The list form of [`ApiResult`].
pub type ApiList<T> = ApiResult<Vec<T>>;

impl<T> ApiResult<T> {
    /// A successful result carrying a payload.
    pub fn ok(payload: T) -> Self {
        Self {
            success: true,
            status_code: None,
            error_message: None,
            refreshed: false,
            payload: Some(payload),
        }
    }

    /// A successful result with no payload (deletes, renames, and the like).
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            status_code: None,
            error_message: None,
            refreshed: false,
            payload: None,
        }
    }

    /// A failed result carrying the remote reason.
    pub fn err(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code,
            error_message: Some(message.into()),
            refreshed: false,
            payload: None,
        }
    }

    /// A failed result built from a transport-level error.
    pub fn from_error(err: &Error) -> Self {
        Self::err(err.status_code(), err.to_string())
    }

    /// Record that the client transparently re-authenticated before this
    /// result was produced.
    pub fn with_refreshed(mut self, refreshed: bool) -> Self {
        self.refreshed = refreshed;
        self
    }

    /// Plain success flag.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The success-or-refresh-token check.
    ///
    /// True when the call succeeded outright or succeeded after the client's
    /// one transparent token refresh and replay. Call sites that talk to the
    /// service use this instead of [`is_success`](Self::is_success); both
    /// outcomes mean "proceed", anything else is a failure to report.
    pub fn is_success_or_refreshed(&self) -> bool {
        self.success
    }

    /// Whether a transparent token refresh happened on the way to this result.
    pub fn refreshed(&self) -> bool {
        self.refreshed
    }

    /// The HTTP status associated with a failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// The remote failure reason, or a fixed fallback for results that
    /// failed without one.
    pub fn error_message(&self) -> &str {
        self.error_message.as_deref().unwrap_or("unknown error")
    }

    /// Borrow the payload, if present.
    pub fn item(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Take the payload, if present.
    pub fn into_item(self) -> Option<T> {
        self.payload
    }
}

impl<T> ApiResult<Vec<T>> {
    /// Borrow the payload list; empty for failures and empty successes.
    pub fn items(&self) -> &[T] {
        self.payload.as_deref().unwrap_or(&[])
    }

    /// Take the payload list; empty for failures and empty successes.
    pub fn into_items(self) -> Vec<T> {
        self.payload.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_carries_payload() {
        let result = ApiResult::ok(42);
        assert!(result.is_success());
        assert!(result.is_success_or_refreshed());
        assert_eq!(result.item(), Some(&42));
        assert_eq!(result.error_message(), "unknown error");
    }

    #[test]
    fn err_carries_reason() {
        let result: ApiResult<()> = ApiResult::err(Some(404), "no such channel");
        assert!(!result.is_success());
        assert!(!result.is_success_or_refreshed());
        assert_eq!(result.status_code(), Some(404));
        assert_eq!(result.error_message(), "no such channel");
        assert!(result.item().is_none());
    }

    #[test]
    fn refreshed_success_proceeds() {
        let result = ApiResult::ok("payload").with_refreshed(true);
        assert!(result.is_success_or_refreshed());
        assert!(result.refreshed());
    }

    #[test]
    fn refreshed_failure_does_not_proceed() {
        let result: ApiResult<()> = ApiResult::err(Some(401), "still unauthorized")
            .with_refreshed(true);
        assert!(!result.is_success_or_refreshed());
    }

    #[test]
    fn list_accessors_default_empty() {
        let result: ApiList<i32> = ApiResult::err(None, "offline");
        assert!(result.items().is_empty());
        assert!(result.into_items().is_empty());

        let result = ApiResult::ok(vec![1, 2, 3]);
        assert_eq!(result.items(), &[1, 2, 3]);
    }
}
