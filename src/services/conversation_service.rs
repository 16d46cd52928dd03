use crate::error::AppError;
use crate::models::conversation::Conversation;
use crate::services::message_service::MessageService;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

/// Conversation Directory: maps a (product, participant pair) to a single
/// conversation and owns the read cursors and aggregate unread counter.
pub struct ConversationService;

impl ConversationService {
    /// Normalize an unordered participant pair to the stored (low, high)
    /// ordering backing the uniqueness constraint.
    pub fn normalize_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn from_row(row: &PgRow) -> Conversation {
        Conversation {
            id: row.get("id"),
            product_id: row.get("product_id"),
            user_low: row.get("user_low"),
            user_high: row.get("user_high"),
            last_message: row.get("last_message"),
            last_message_at: row.get("last_message_at"),
            unread_count: row.get("unread_count"),
            blocked_by: row.get("blocked_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    const COLUMNS: &'static str = "id, product_id, user_low, user_high, last_message, \
         last_message_at, unread_count, blocked_by, created_at, updated_at";

    pub async fn get(
        db: &Pool<Postgres>,
        conversation_id: Uuid,
    ) -> Result<Option<Conversation>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM conversations WHERE id = $1",
            Self::COLUMNS
        ))
        .bind(conversation_id)
        .fetch_optional(db)
        .await?;
        Ok(row.as_ref().map(Self::from_row))
    }

    async fn find_by_key(
        db: &Pool<Postgres>,
        product_id: Uuid,
        user_low: Uuid,
        user_high: Uuid,
    ) -> Result<Option<Conversation>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM conversations \
             WHERE product_id = $1 AND user_low = $2 AND user_high = $3",
            Self::COLUMNS
        ))
        .bind(product_id)
        .bind(user_low)
        .bind(user_high)
        .fetch_optional(db)
        .await?;
        Ok(row.as_ref().map(Self::from_row))
    }

    /// Return the existing conversation for the pair and product, or create
    /// it with both read cursors at creation time and unread_count = 0.
    ///
    /// Safe under concurrent calls: the insert rides on the unique index and
    /// a loser of the race falls back to reading the winner's row instead of
    /// surfacing a conflict.
    pub async fn find_or_create(
        db: &Pool<Postgres>,
        product_id: Uuid,
        a: Uuid,
        b: Uuid,
    ) -> Result<Conversation, AppError> {
        let (user_low, user_high) = Self::normalize_pair(a, b);

        if let Some(existing) = Self::find_by_key(db, product_id, user_low, user_high).await? {
            return Ok(existing);
        }

        match Self::create(db, product_id, user_low, user_high).await {
            Err(AppError::Conflict) => {
                // Another request created the row first; its commit is
                // visible once the conflicting insert has resolved.
                tracing::debug!(%product_id, "conversation create lost race, reusing winner");
                Self::find_by_key(db, product_id, user_low, user_high)
                    .await?
                    .ok_or(AppError::Internal)
            }
            other => other,
        }
    }

    /// Insert the directory row and both read cursors. Fails `Conflict`
    /// when a concurrent create for the same key wins the unique index.
    async fn create(
        db: &Pool<Postgres>,
        product_id: Uuid,
        user_low: Uuid,
        user_high: Uuid,
    ) -> Result<Conversation, AppError> {
        let id = Uuid::new_v4();
        let mut tx = db.begin().await?;
        let inserted = sqlx::query(
            "INSERT INTO conversations (id, product_id, user_low, user_high) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (product_id, user_low, user_high) DO NOTHING",
        )
        .bind(id)
        .bind(product_id)
        .bind(user_low)
        .bind(user_high)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict);
        }

        sqlx::query(
            "INSERT INTO conversation_participants (conversation_id, user_id) \
             VALUES ($1, $2), ($1, $3)",
        )
        .bind(id)
        .bind(user_low)
        .bind(user_high)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Self::get(db, id).await?.ok_or(AppError::Internal)
    }

    /// Conversations where `user_id` participates, most recent activity
    /// first, offset-paginated.
    pub async fn list_for_user(
        db: &Pool<Postgres>,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversation>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM conversations \
             WHERE user_low = $1 OR user_high = $1 \
             ORDER BY last_message_at DESC \
             LIMIT $2 OFFSET $3",
            Self::COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows.iter().map(Self::from_row).collect())
    }

    /// Advance the participant's read cursor and reset the aggregate unread
    /// counter. Runs on the caller's transaction so the ledger's per-message
    /// flags commit together with the cursor.
    pub async fn mark_read(
        tx: &mut Transaction<'_, Postgres>,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let updated = sqlx::query(
            "UPDATE conversation_participants SET last_read_at = NOW() \
             WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Forbidden);
        }

        sqlx::query(
            "UPDATE conversations SET unread_count = 0, updated_at = NOW() WHERE id = $1",
        )
        .bind(conversation_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Fold an outgoing message into the denormalized summary. The counter
    /// increment is a single conditional update, never read-modify-write in
    /// the caller, so concurrent senders cannot lose increments.
    pub async fn record_outgoing_message(
        tx: &mut Transaction<'_, Postgres>,
        conversation_id: Uuid,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE conversations \
             SET last_message = $2, \
                 last_message_at = GREATEST(last_message_at, $3), \
                 unread_count = unread_count + 1, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(conversation_id)
        .bind(text)
        .bind(at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Hard delete with transactional cascade: messages, read cursors and
    /// the conversation row disappear together or not at all.
    pub async fn delete(
        db: &Pool<Postgres>,
        conversation_id: Uuid,
        requester_id: Uuid,
    ) -> Result<(), AppError> {
        let conversation = Self::get(db, conversation_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if !conversation.has_participant(requester_id) {
            return Err(AppError::Forbidden);
        }

        let mut tx = db.begin().await?;
        MessageService::delete_all(&mut tx, conversation_id).await?;
        sqlx::query("DELETE FROM conversation_participants WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(%conversation_id, "conversation deleted");
        Ok(())
    }

    /// Record a block by `user_id`. While set, sends from either side fail.
    /// Idempotent for the holder; an existing block by the other participant
    /// cannot be taken over (that would let the blocked side unblock itself).
    pub async fn block(
        db: &Pool<Postgres>,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let updated = sqlx::query(
            "UPDATE conversations SET blocked_by = $2, updated_at = NOW() \
             WHERE id = $1 AND (blocked_by IS NULL OR blocked_by = $2)",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    /// Clear a block, but only the participant who placed it may lift it.
    pub async fn unblock(
        db: &Pool<Postgres>,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let updated = sqlx::query(
            "UPDATE conversations SET blocked_by = NULL, updated_at = NOW() \
             WHERE id = $1 AND blocked_by = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}
