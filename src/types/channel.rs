use std::fmt;

use serde::{Deserialize, Serialize};

/// Visibility class of a channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// Anyone in the account may join.
    Public,

    /// Membership is by invitation only.
    Private,

    /// A one-to-one conversation.
    Direct,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelType::Public => write!(f, "public"),
            ChannelType::Private => write!(f, "private"),
            ChannelType::Direct => write!(f, "direct"),
        }
    }
}

/// A named chat destination with members and messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Server-assigned channel ID.
    pub id: String,

    /// Display name of the channel.
    pub name: String,

    /// Visibility class.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<ChannelType>,
}

impl Channel {
    /// Create a new channel record.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            channel_type: None,
        }
    }

    /// Set the visibility class.
    pub fn with_type(mut self, channel_type: ChannelType) -> Self {
        self.channel_type = Some(channel_type);
        self
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.channel_type {
            Some(t) => write!(f, "{}: {} (type: {})", self.name, self.id, t),
            None => write!(f, "{}: {}", self.name, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_type_serialization() {
        let json = serde_json::to_string(&ChannelType::Private).unwrap();
        assert_eq!(json, r#""private""#);
        let t: ChannelType = serde_json::from_str(r#""public""#).unwrap();
        assert_eq!(t, ChannelType::Public);
    }

    #[test]
    fn channel_display() {
        let channel = Channel::new("abc123", "general").with_type(ChannelType::Public);
        assert_eq!(channel.to_string(), "general: abc123 (type: public)");
    }

    #[test]
    fn channel_deserializes_wire_shape() {
        let json = r#"{"id":"c1","name":"eng","type":"private"}"#;
        let channel: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(channel.name, "eng");
        assert_eq!(channel.channel_type, Some(ChannelType::Private));
    }
}
