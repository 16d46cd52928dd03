//! Authorization guards that enforce permission checks at the type level
//! so handlers cannot accidentally skip them.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::conversation::Conversation;
use crate::services::conversation_service::ConversationService;

/// The authenticated requester, resolved by the auth middleware.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for User
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set into extensions by middleware::auth
        let user_id = parts
            .extensions
            .get::<Uuid>()
            .cloned()
            .ok_or(AppError::Unauthorized)?;

        Ok(User { id: user_id })
    }
}

/// A requester verified to be one of the conversation's two participants.
#[derive(Debug, Clone)]
pub struct Participant {
    pub user_id: Uuid,
    pub conversation: Conversation,
}

impl Participant {
    /// Fails NotFound when the conversation does not exist and Forbidden
    /// when it exists but the requester is not a party to it. Every
    /// mutation path runs this before touching state.
    pub async fn verify(
        db: &PgPool,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Self, AppError> {
        let conversation = ConversationService::get(db, conversation_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !conversation.has_participant(user_id) {
            return Err(AppError::Forbidden);
        }

        Ok(Participant {
            user_id,
            conversation,
        })
    }

    /// Sends are gated by an active block from either side.
    pub fn can_send(&self) -> Result<(), AppError> {
        if self.conversation.is_blocked() {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn participant(blocked_by: Option<Uuid>) -> Participant {
        let user_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let (low, high) = ConversationService::normalize_pair(user_id, other);
        Participant {
            user_id,
            conversation: Conversation {
                id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                user_low: low,
                user_high: high,
                last_message: String::new(),
                last_message_at: Utc::now(),
                unread_count: 0,
                blocked_by,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    #[test]
    fn participant_can_send_when_not_blocked() {
        assert!(participant(None).can_send().is_ok());
    }

    #[test]
    fn participant_cannot_send_when_blocked() {
        let blocker = Uuid::new_v4();
        assert!(participant(Some(blocker)).can_send().is_err());
    }
}
