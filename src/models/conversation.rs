use crate::models::product::ProductSummary;
use crate::models::user::PublicUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directory row. The participant pair is stored normalized
/// (user_low < user_high) so the unique index covers the unordered pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_low: Uuid,
    pub user_high: Uuid,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i32,
    pub blocked_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.user_low == user_id || self.user_high == user_id
    }

    /// The counterpart of `user_id` in this two-party conversation.
    /// Callers must check membership first.
    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if self.user_low == user_id {
            self.user_high
        } else {
            self.user_low
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked_by.is_some()
    }
}

/// Caller-relative projection shaped for conversation list views.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub id: Uuid,
    pub participant: Option<PublicUser>,
    pub product: Option<ProductSummary>,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (Uuid, Uuid) {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn conversation(low: Uuid, high: Uuid) -> Conversation {
        Conversation {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            user_low: low,
            user_high: high,
            last_message: String::new(),
            last_message_at: Utc::now(),
            unread_count: 0,
            blocked_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn other_participant_is_symmetric() {
        let (low, high) = pair();
        let conv = conversation(low, high);
        assert_eq!(conv.other_participant(low), high);
        assert_eq!(conv.other_participant(high), low);
    }

    #[test]
    fn membership_covers_both_participants_only() {
        let (low, high) = pair();
        let conv = conversation(low, high);
        assert!(conv.has_participant(low));
        assert!(conv.has_participant(high));
        assert!(!conv.has_participant(Uuid::new_v4()));
    }
}
