use std::fmt;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned message ID.
    pub id: String,

    /// Message body.
    pub message: String,

    /// Display name of the sender, when the server includes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    /// Time the message was posted.
    #[serde(with = "time::serde::rfc3339")]
    pub date_time: OffsetDateTime,
}

impl Message {
    /// Create a new message record posted now.
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            sender: None,
            date_time: OffsetDateTime::now_utc(),
        }
    }

    /// Set the sender display name.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Set the posting time.
    pub fn with_date_time(mut self, date_time: OffsetDateTime) -> Self {
        self.date_time = date_time;
        self
    }

    /// The posting time shifted to the local offset, falling back to UTC
    /// when the local offset cannot be determined.
    pub fn local_date_time(&self) -> OffsetDateTime {
        match UtcOffset::current_local_offset() {
            Ok(offset) => self.date_time.to_offset(offset),
            Err(_) => self.date_time,
        }
    }

    /// Sender display name, or an empty string when the server omitted it.
    pub fn sender_or_empty(&self) -> &str {
        self.sender.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.local_date_time(),
            self.sender_or_empty(),
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn message_round_trips_rfc3339() {
        let message = Message::new("m1", "hello")
            .with_sender("ada")
            .with_date_time(datetime!(2020-04-25 12:30:00 UTC));
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("2020-04-25T12:30:00"));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn sender_defaults_to_empty() {
        let message = Message::new("m2", "no sender");
        assert_eq!(message.sender_or_empty(), "");
    }
}
