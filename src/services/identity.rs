use crate::error::AppError;
use crate::models::user::PublicUser;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

/// Read-only access to the user records owned by the identity service.
pub struct IdentityStore;

impl IdentityStore {
    pub async fn get_public(
        db: &Pool<Postgres>,
        user_id: Uuid,
    ) -> Result<Option<PublicUser>, AppError> {
        let row = sqlx::query("SELECT id, display_name, avatar_url FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;

        Ok(row.map(|r| PublicUser {
            id: r.get("id"),
            name: r.get("display_name"),
            avatar: r.get("avatar_url"),
        }))
    }

    pub async fn exists(db: &Pool<Postgres>, user_id: Uuid) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = $1 LIMIT 1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
        Ok(row.is_some())
    }

    /// Public identities for both parties of a conversation, for message
    /// projection without a per-message lookup.
    pub async fn get_public_many(
        db: &Pool<Postgres>,
        user_ids: &[Uuid],
    ) -> Result<Vec<PublicUser>, AppError> {
        let rows =
            sqlx::query("SELECT id, display_name, avatar_url FROM users WHERE id = ANY($1)")
                .bind(user_ids)
                .fetch_all(db)
                .await?;

        Ok(rows
            .into_iter()
            .map(|r| PublicUser {
                id: r.get("id"),
                name: r.get("display_name"),
                avatar: r.get("avatar_url"),
            })
            .collect())
    }
}
