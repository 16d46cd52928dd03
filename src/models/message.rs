use crate::models::user::PublicUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    System,
}

impl Default for MessageKind {
    fn default() -> Self {
        MessageKind::Text
    }
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::System => "system",
        }
    }

    /// Decode a stored kind. The column carries a CHECK constraint, so any
    /// other value indicates drift and falls back to plain text.
    pub fn from_db(value: &str) -> Self {
        match value {
            "image" => MessageKind::Image,
            "system" => MessageKind::System,
            _ => MessageKind::Text,
        }
    }
}

/// Ledger row. Immutable after creation except for `is_read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub kind: MessageKind,
    pub is_read: bool,
    pub is_delivered: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn view(&self, requester: Uuid, sender: PublicUser) -> MessageView {
        MessageView {
            id: self.id,
            text: self.body.clone(),
            kind: self.kind,
            is_mine: self.sender_id == requester,
            timestamp: self.created_at,
            is_delivered: self.is_delivered,
            is_read: self.is_read,
            sender,
        }
    }
}

/// Caller-relative projection shaped for chat views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub text: String,
    pub kind: MessageKind,
    pub is_mine: bool,
    pub timestamp: DateTime<Utc>,
    pub is_delivered: bool,
    pub is_read: bool,
    pub sender: PublicUser,
}
