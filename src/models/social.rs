//! Inbound social-network messages (Instagram inbox).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Record;

pub const INSTAGRAM_KEY: &str = "social_instagram";
pub const INSTAGRAM_CHANNEL: &str = "instagram";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SocialMessage {
    pub id: String,
    pub channel: String,
    pub sender: Sender,
    pub content: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for SocialMessage {
    const KEY: &'static str = INSTAGRAM_KEY;
    const LABEL: &'static str = "Mensagem";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Triage operations accepted by `POST /social/instagram`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum InboxAction {
    Receive {
        sender: Sender,
        content: String,
    },
    MarkRead {
        id: String,
        #[serde(default = "crate::models::user::default_true")]
        read: bool,
    },
    Assign {
        id: String,
        #[serde(default, rename = "assignedTo")]
        assigned_to: Option<String>,
    },
    Reply {
        id: String,
        content: String,
    },
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReadStatus {
    #[default]
    All,
    Read,
    Unread,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: ReadStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

impl InboxQuery {
    pub fn matches(&self, message: &SocialMessage) -> bool {
        let status_ok = match self.status {
            ReadStatus::All => true,
            ReadStatus::Read => message.read,
            ReadStatus::Unread => !message.read,
        };
        let assignee_ok = match &self.assigned_to {
            Some(user_id) => message.assigned_to.as_deref() == Some(user_id.as_str()),
            None => true,
        };
        status_ok && assignee_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing() {
        let action: InboxAction = serde_json::from_value(serde_json::json!({
            "action": "assign",
            "id": "m1",
            "assignedTo": "u2"
        }))
        .unwrap();
        assert!(matches!(
            action,
            InboxAction::Assign { ref id, assigned_to: Some(ref to) } if id == "m1" && to == "u2"
        ));

        let action: InboxAction =
            serde_json::from_value(serde_json::json!({ "action": "markRead", "id": "m1" }))
                .unwrap();
        assert!(matches!(action, InboxAction::MarkRead { read: true, .. }));

        let bad =
            serde_json::from_value::<InboxAction>(serde_json::json!({ "action": "archive" }));
        assert!(bad.is_err());
    }
}
