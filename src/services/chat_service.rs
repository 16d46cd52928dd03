use crate::error::AppError;
use crate::middleware::guards::Participant;
use crate::models::conversation::{Conversation, ConversationView};
use crate::models::message::{MessageKind, MessageView};
use crate::models::user::PublicUser;
use crate::services::catalog::CatalogStore;
use crate::services::conversation_service::ConversationService;
use crate::services::identity::IdentityStore;
use crate::services::message_service::MessageService;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use std::collections::HashMap;
use uuid::Uuid;

/// Orchestrates the Conversation Directory and Message Ledger behind the
/// public marketplace chat operations. All membership and existence checks
/// happen here, before any mutation.
pub struct ChatService;

impl ChatService {
    /// Start (or resume) the conversation between the requester and
    /// `receiver_id` about a listing. Idempotent: repeated calls converge
    /// on the same conversation. An optional opening message is appended
    /// atomically with the summary update.
    pub async fn start_conversation(
        db: &Pool<Postgres>,
        requester: Uuid,
        product_id: Uuid,
        receiver_id: Uuid,
        initial_text: Option<String>,
    ) -> Result<ConversationView, AppError> {
        if receiver_id == requester {
            return Err(AppError::Validation(
                "cannot start a conversation with yourself".into(),
            ));
        }

        CatalogStore::find_active(db, product_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if !IdentityStore::exists(db, receiver_id).await? {
            return Err(AppError::NotFound);
        }

        let conversation =
            ConversationService::find_or_create(db, product_id, requester, receiver_id).await?;

        let initial_text = initial_text.filter(|t| !t.trim().is_empty());
        let conversation = if let Some(text) = initial_text {
            // Resuming an existing conversation: the opening message is a
            // send like any other and honors an active block.
            if conversation.is_blocked() {
                return Err(AppError::Forbidden);
            }
            Self::append_with_summary(db, conversation.id, requester, &text, MessageKind::Text)
                .await?;
            // Re-read so the projection carries the fresh summary.
            ConversationService::get(db, conversation.id)
                .await?
                .ok_or(AppError::Internal)?
        } else {
            conversation
        };

        Self::project_conversation(db, &conversation, requester).await
    }

    /// Append a message and fold it into the conversation summary as one
    /// logical transaction: the message is never visible without the
    /// summary update, and vice versa.
    async fn append_with_summary(
        db: &Pool<Postgres>,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
        kind: MessageKind,
    ) -> Result<crate::models::message::Message, AppError> {
        let at = Utc::now();
        let mut tx = db.begin().await?;
        let message =
            MessageService::append(&mut tx, conversation_id, sender_id, body, kind, at).await?;
        ConversationService::record_outgoing_message(&mut tx, conversation_id, body, at).await?;
        tx.commit().await?;
        Ok(message)
    }

    pub async fn send_message(
        db: &Pool<Postgres>,
        requester: Uuid,
        conversation_id: Uuid,
        body: &str,
        kind: MessageKind,
    ) -> Result<MessageView, AppError> {
        let participant = Participant::verify(db, requester, conversation_id).await?;
        participant.can_send()?;

        let message =
            Self::append_with_summary(db, conversation_id, requester, body, kind).await?;

        let sender = IdentityStore::get_public(db, requester)
            .await?
            .ok_or(AppError::Internal)?;
        Ok(message.view(requester, sender))
    }

    /// Paged history, oldest-first, with the total count for pagination
    /// metadata.
    pub async fn history(
        db: &Pool<Postgres>,
        requester: Uuid,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MessageView>, i64), AppError> {
        let participant = Participant::verify(db, requester, conversation_id).await?;

        let (messages, total) =
            MessageService::page(db, conversation_id, limit, offset).await?;

        let conversation = &participant.conversation;
        let senders: HashMap<Uuid, PublicUser> = IdentityStore::get_public_many(
            db,
            &[conversation.user_low, conversation.user_high],
        )
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

        let views = messages
            .into_iter()
            .map(|m| {
                let sender = senders.get(&m.sender_id).cloned().unwrap_or(PublicUser {
                    id: m.sender_id,
                    name: String::new(),
                    avatar: None,
                });
                m.view(requester, sender)
            })
            .collect();

        Ok((views, total))
    }

    /// Advance the requester's read cursor, zero the unread counter and
    /// flag the other participant's messages read, all in one transaction.
    pub async fn mark_read(
        db: &Pool<Postgres>,
        requester: Uuid,
        conversation_id: Uuid,
    ) -> Result<(), AppError> {
        Participant::verify(db, requester, conversation_id).await?;

        let mut tx = db.begin().await?;
        ConversationService::mark_read(&mut tx, conversation_id, requester).await?;
        let flagged = MessageService::mark_all_read(&mut tx, conversation_id, requester).await?;
        tx.commit().await?;

        tracing::debug!(%conversation_id, flagged, "conversation marked read");
        Ok(())
    }

    pub async fn delete_conversation(
        db: &Pool<Postgres>,
        requester: Uuid,
        conversation_id: Uuid,
    ) -> Result<(), AppError> {
        ConversationService::delete(db, conversation_id, requester).await
    }

    pub async fn get_conversation(
        db: &Pool<Postgres>,
        requester: Uuid,
        conversation_id: Uuid,
    ) -> Result<ConversationView, AppError> {
        let participant = Participant::verify(db, requester, conversation_id).await?;
        Self::project_conversation(db, &participant.conversation, requester).await
    }

    pub async fn list_conversations(
        db: &Pool<Postgres>,
        requester: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ConversationView>, AppError> {
        let conversations =
            ConversationService::list_for_user(db, requester, limit, offset).await?;

        let mut views = Vec::with_capacity(conversations.len());
        for conversation in &conversations {
            views.push(Self::project_conversation(db, conversation, requester).await?);
        }
        Ok(views)
    }

    pub async fn block(
        db: &Pool<Postgres>,
        requester: Uuid,
        conversation_id: Uuid,
    ) -> Result<(), AppError> {
        Participant::verify(db, requester, conversation_id).await?;
        ConversationService::block(db, conversation_id, requester).await
    }

    pub async fn unblock(
        db: &Pool<Postgres>,
        requester: Uuid,
        conversation_id: Uuid,
    ) -> Result<(), AppError> {
        Participant::verify(db, requester, conversation_id).await?;
        ConversationService::unblock(db, conversation_id, requester).await
    }

    /// Shape a conversation for the requester: the *other* party's public
    /// identity plus the listing summary and denormalized tail.
    async fn project_conversation(
        db: &Pool<Postgres>,
        conversation: &Conversation,
        requester: Uuid,
    ) -> Result<ConversationView, AppError> {
        let other = conversation.other_participant(requester);
        let participant = IdentityStore::get_public(db, other).await?;
        let product = CatalogStore::get_summary(db, conversation.product_id).await?;

        Ok(ConversationView {
            id: conversation.id,
            participant,
            product,
            last_message: conversation.last_message.clone(),
            last_message_at: conversation.last_message_at,
            unread_count: conversation.unread_count,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        })
    }
}
