use crate::error::AppError;
use crate::models::message::{Message, MessageKind};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

/// Message Ledger: append-only per-conversation sequence with per-message
/// read and delivery flags. Ordering is the (created_at, id) total order.
pub struct MessageService;

impl MessageService {
    fn from_row(row: &PgRow) -> Message {
        let kind: String = row.get("kind");
        Message {
            id: row.get("id"),
            conversation_id: row.get("conversation_id"),
            sender_id: row.get("sender_id"),
            body: row.get("body"),
            kind: MessageKind::from_db(&kind),
            is_read: row.get("is_read"),
            is_delivered: row.get("is_delivered"),
            created_at: row.get("created_at"),
        }
    }

    /// Append a message on the caller's transaction, so the ledger row and
    /// the directory's summary update commit together. Synchronous delivery
    /// model: delivered is stamped true at creation.
    pub async fn append(
        tx: &mut Transaction<'_, Postgres>,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
        kind: MessageKind,
        at: DateTime<Utc>,
    ) -> Result<Message, AppError> {
        if body.trim().is_empty() {
            return Err(AppError::Validation("message body cannot be empty".into()));
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO messages (id, conversation_id, sender_id, body, kind, \
                                   is_read, is_delivered, created_at) \
             VALUES ($1, $2, $3, $4, $5, FALSE, TRUE, $6)",
        )
        .bind(id)
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .bind(kind.as_str())
        .bind(at)
        .execute(&mut **tx)
        .await?;

        Ok(Message {
            id,
            conversation_id,
            sender_id,
            body: body.to_string(),
            kind,
            is_read: false,
            is_delivered: true,
            created_at: at,
        })
    }

    /// One window of history, oldest-first, plus the total count for
    /// pagination metadata. The window is selected from the newest-first
    /// index scan and reversed, keyed on (created_at, id) rather than
    /// physical position, so windows stay stable and gap-free while new
    /// messages are appended concurrently.
    pub async fn page(
        db: &Pool<Postgres>,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Message>, i64), AppError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
                .bind(conversation_id)
                .fetch_one(db)
                .await?;

        let rows = sqlx::query(
            "SELECT id, conversation_id, sender_id, body, kind, is_read, is_delivered, created_at \
             FROM messages \
             WHERE conversation_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(conversation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        let mut messages: Vec<Message> = rows.iter().map(Self::from_row).collect();
        messages.reverse();
        Ok((messages, total))
    }

    /// Flag every message not sent by `reader_id` as read. Idempotent.
    pub async fn mark_all_read(
        tx: &mut Transaction<'_, Postgres>,
        conversation_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, AppError> {
        let updated = sqlx::query(
            "UPDATE messages SET is_read = TRUE \
             WHERE conversation_id = $1 AND sender_id <> $2 AND is_read = FALSE",
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&mut **tx)
        .await?;
        Ok(updated.rows_affected())
    }

    /// Purge the conversation's messages; only invoked from the directory's
    /// cascading delete, on its transaction.
    pub async fn delete_all(
        tx: &mut Transaction<'_, Postgres>,
        conversation_id: Uuid,
    ) -> Result<u64, AppError> {
        let deleted = sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&mut **tx)
            .await?;
        Ok(deleted.rows_affected())
    }
}
