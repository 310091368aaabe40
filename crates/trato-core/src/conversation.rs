//! Conversation summaries for the deal owner's chat sidebar.
//!
//! These are read-only projections the backend derives from the message
//! threads; the client never writes them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MessageId;
use crate::user::UserSummary;

/// One entry in the owner's conversation list: who is talking, what they
/// said last, and how many of their messages are still unread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub peer: UserSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<ConversationPreview>,
    #[serde(default)]
    pub unread: u32,
}

impl Conversation {
    pub fn has_unread(&self) -> bool {
        self.unread > 0
    }
}

/// The trailing message shown under a conversation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationPreview {
    pub id: MessageId,
    pub from_me: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}
