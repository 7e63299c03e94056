//! Error types for the hubbub client.
//!
//! This module defines the error type used throughout the crate for
//! everything that can go wrong while driving a remote team-chat service
//! from the terminal.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// The main error type for the hubbub client.
#[derive(Clone, Debug)]
pub enum Error {
    /// The remote API rejected a request.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Human-readable error message.
        message: String,
        /// Request ID for debugging and support.
        request_id: Option<String>,
    },

    /// Authentication error.
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// Connection error.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Request timed out.
    Timeout {
        /// Human-readable error message.
        message: String,
    },

    /// Error during JSON serialization or deserialization.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// Configuration file error.
    Config {
        /// Human-readable error message.
        message: String,
        /// Config key that caused the error.
        key: Option<String>,
    },

    /// The tunnel provider failed to expose a public URL.
    Tunnel {
        /// Human-readable error message.
        message: String,
    },

    /// Error during validation of user input or request parameters.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },

    /// The terminal input stream was closed.
    InputClosed {
        /// Human-readable error message.
        message: String,
    },

    /// Monitor registry error.
    Monitor {
        /// Human-readable error message.
        message: String,
        /// The channel name involved, if any.
        channel: Option<String>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },
}

impl Error {
    /// Creates a new API error.
    pub fn api(status_code: u16, message: impl Into<String>, request_id: Option<String>) -> Self {
        Error::Api {
            status_code,
            message: message.into(),
            request_id,
        }
    }

    /// Creates a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Error::Timeout {
            message: message.into(),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new configuration error.
    pub fn config(message: impl Into<String>, key: Option<String>) -> Self {
        Error::Config {
            message: message.into(),
            key,
        }
    }

    /// Creates a new tunnel error.
    pub fn tunnel(message: impl Into<String>) -> Self {
        Error::Tunnel {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Creates a new input-closed error.
    pub fn input_closed(message: impl Into<String>) -> Self {
        Error::InputClosed {
            message: message.into(),
        }
    }

    /// Creates a new monitor error.
    pub fn monitor(message: impl Into<String>, channel: Option<String>) -> Self {
        Error::Monitor {
            message: message.into(),
            channel,
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Returns true if this error is related to authentication.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// Returns true if this error is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config { .. })
    }

    /// Returns true if this error means the terminal input stream is gone.
    pub fn is_input_closed(&self) -> bool {
        matches!(self, Error::InputClosed { .. })
    }

    /// Returns true if this error is a monitor registry error.
    pub fn is_monitor(&self) -> bool {
        matches!(self, Error::Monitor { .. })
    }

    /// Returns true if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns true if retrying the operation could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api { status_code, .. } => {
                matches!(status_code, 408 | 409 | 429 | 500..=599)
            }
            Error::Timeout { .. } => true,
            Error::Connection { .. } => true,
            _ => false,
        }
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                status_code,
                message,
                request_id,
            } => {
                if let Some(request_id) = request_id {
                    write!(
                        f,
                        "API error ({status_code}): {message} (Request ID: {request_id})"
                    )
                } else {
                    write!(f, "API error ({status_code}): {message}")
                }
            }
            Error::Authentication { message } => {
                write!(f, "Authentication error: {message}")
            }
            Error::Connection { message, .. } => {
                write!(f, "Connection error: {message}")
            }
            Error::Timeout { message } => {
                write!(f, "Timeout error: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Io { message, source } => {
                write!(f, "I/O error: {message} ({source})")
            }
            Error::Config { message, key } => {
                if let Some(key) = key {
                    write!(f, "Config error: {message} (key: {key})")
                } else {
                    write!(f, "Config error: {message}")
                }
            }
            Error::Tunnel { message } => {
                write!(f, "Tunnel error: {message}")
            }
            Error::Validation { message, param } => {
                if let Some(param) = param {
                    write!(f, "Validation error: {message} (parameter: {param})")
                } else {
                    write!(f, "Validation error: {message}")
                }
            }
            Error::InputClosed { message } => {
                write!(f, "Input closed: {message}")
            }
            Error::Monitor { message, channel } => {
                if let Some(channel) = channel {
                    write!(f, "Monitor error: {message} (channel: {channel})")
                } else {
                    write!(f, "Monitor error: {message}")
                }
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn error::Error + 'static)),
            Error::Serialization { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source.as_ref()),
            Error::Url {
                source: Some(source),
                ..
            } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io("I/O operation failed", err)
    }
}

/// A specialized Result type for hubbub operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_api_error() {
        let err = Error::api(404, "channel not found", None);
        assert_eq!(err.to_string(), "API error (404): channel not found");

        let err = Error::api(500, "boom", Some("req-123".to_string()));
        assert_eq!(
            err.to_string(),
            "API error (500): boom (Request ID: req-123)"
        );
    }

    #[test]
    fn display_validation_error() {
        let err = Error::validation("not an email", Some("email".to_string()));
        assert_eq!(
            err.to_string(),
            "Validation error: not an email (parameter: email)"
        );
    }

    #[test]
    fn retryable_classification() {
        assert!(Error::api(500, "server", None).is_retryable());
        assert!(Error::api(429, "slow down", None).is_retryable());
        assert!(Error::timeout("too slow").is_retryable());
        assert!(!Error::api(400, "bad", None).is_retryable());
        assert!(!Error::validation("bad", None).is_retryable());
        assert!(!Error::input_closed("eof").is_retryable());
    }

    #[test]
    fn predicates() {
        assert!(Error::authentication("no token").is_authentication());
        assert!(Error::config("missing", None).is_config());
        assert!(Error::input_closed("eof").is_input_closed());
        assert!(Error::monitor("dup", Some("general".to_string())).is_monitor());
    }

    #[test]
    fn status_code_accessor() {
        assert_eq!(Error::api(403, "nope", None).status_code(), Some(403));
        assert_eq!(Error::tunnel("down").status_code(), None);
    }
}
