//! Messages inside a deal's two-party threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, UserId};

/// A persisted chat message. Whether it is "mine" is derived by comparing
/// [`Message::sender`] with the session user, never stored.
///
/// `read_at` doubles as the read receipt: its presence means the other
/// party has seen the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_from(&self, user: UserId) -> bool {
        self.sender == user
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// An unsaved outgoing message. The backend derives the sender from the
/// session token; the recipient is only needed when the deal owner writes
/// into one of several counterpart threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_user: Option<UserId>,
}

impl MessageDraft {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: body.into(),
            to_user: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_recipient(mut self, user: UserId) -> Self {
        self.to_user = Some(user);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_state_comes_from_timestamp_presence() {
        let mut message = Message {
            id: MessageId::new(1),
            sender: UserId::new(10),
            title: None,
            body: "hello".to_string(),
            sent_at: Some(Utc::now()),
            read_at: None,
        };
        assert!(!message.is_read());
        message.read_at = Some(Utc::now());
        assert!(message.is_read());
    }

    #[test]
    fn timestamps_round_trip_as_rfc3339() {
        let json = serde_json::json!({
            "id": 3,
            "sender": 10,
            "body": "done deal",
            "sent_at": "2026-02-01T09:30:00Z",
            "read_at": "2026-02-01T09:31:12Z",
        });
        let message: Message = serde_json::from_value(json).unwrap();
        assert!(message.is_read());
        let sent = message.sent_at.unwrap();
        assert_eq!(sent.to_rfc3339(), "2026-02-01T09:30:00+00:00");
    }

    #[test]
    fn draft_builder_sets_title_and_recipient() {
        let draft = MessageDraft::new("is it still available?")
            .with_title("Question")
            .with_recipient(UserId::new(4));
        assert_eq!(draft.title.as_deref(), Some("Question"));
        assert_eq!(draft.to_user, Some(UserId::new(4)));
    }
}
