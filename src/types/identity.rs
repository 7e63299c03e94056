use std::fmt;

use serde::{Deserialize, Serialize};

/// The authenticated caller's profile, fetched once during bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Server-assigned user ID.
    pub id: String,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Email address the account is registered under.
    pub email: String,
}

impl Identity {
    /// Create a new identity record.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            email: email.into(),
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_name.as_deref() {
            Some(name) => write!(f, "{} <{}> [{}]", name, self.email, self.id),
            None => write!(f, "<{}> [{}]", self.email, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_display() {
        let identity = Identity::new("u1", "ada@example.com").with_display_name("Ada");
        assert_eq!(identity.to_string(), "Ada <ada@example.com> [u1]");
    }
}
