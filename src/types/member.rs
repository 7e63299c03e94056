use std::fmt;

use serde::{Deserialize, Serialize};

/// A channel member or external contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Server-assigned member ID.
    pub id: String,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Role within the channel (owner, admin, member), when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Email address.
    pub email: String,
}

impl Member {
    /// Create a new member record.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            role: None,
            email: email.into(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the channel role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("(unnamed)");
        match self.role.as_deref() {
            Some(role) => write!(f, "{} ({}): {}", name, role, self.email),
            None => write!(f, "{}: {}", name, self.email),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_display_with_role() {
        let member = Member::new("u1", "ada@example.com")
            .with_name("Ada")
            .with_role("owner");
        assert_eq!(member.to_string(), "Ada (owner): ada@example.com");
    }

    #[test]
    fn member_display_without_role() {
        let member = Member::new("u2", "bob@example.com").with_name("Bob");
        assert_eq!(member.to_string(), "Bob: bob@example.com");
    }
}
