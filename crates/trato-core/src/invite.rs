//! Invites a user sends to bring someone onto the platform.

use serde::{Deserialize, Serialize};

use crate::ids::{InviteId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InviteStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "Pending",
            InviteStatus::Accepted => "Accepted",
            InviteStatus::Rejected => "Rejected",
        }
    }

    pub fn all() -> [InviteStatus; 3] {
        [
            InviteStatus::Pending,
            InviteStatus::Accepted,
            InviteStatus::Rejected,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invite {
    pub id: InviteId,
    pub name: String,
    pub email: String,
    /// Who sent the invite. Older backend rows may not carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inviter: Option<UserId>,
    /// The account created from this invite, once there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitee: Option<UserId>,
    pub status: InviteStatus,
}

/// An unsaved invite. The backend fills in the inviter from the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteDraft {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitee: Option<UserId>,
}

impl InviteDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            invitee: None,
        }
    }
}

/// Partial invite update: fixing the name or email, or moving the status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvitePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InviteStatus>,
}

impl InvitePatch {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_status(mut self, status: InviteStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_string(&InviteStatus::Pending).unwrap(),
            "\"pending\""
        );
        let status: InviteStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(status, InviteStatus::Rejected);
    }
}
