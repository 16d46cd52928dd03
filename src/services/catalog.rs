use crate::error::AppError;
use crate::models::product::ProductSummary;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

/// Read-only access to the listings owned by the catalog service.
pub struct CatalogStore;

impl CatalogStore {
    pub async fn get_summary(
        db: &Pool<Postgres>,
        product_id: Uuid,
    ) -> Result<Option<ProductSummary>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, price_cents, image_url, status FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(db)
        .await?;

        Ok(row.map(|r| ProductSummary {
            id: r.get("id"),
            title: r.get("title"),
            price_cents: r.get("price_cents"),
            image_url: r.get("image_url"),
            status: r.get("status"),
        }))
    }

    /// Lookup used when validating a conversation start: the listing must
    /// exist and must not have been removed from the catalog.
    pub async fn find_active(
        db: &Pool<Postgres>,
        product_id: Uuid,
    ) -> Result<Option<ProductSummary>, AppError> {
        let summary = Self::get_summary(db, product_id).await?;
        Ok(summary.filter(|p| !p.is_deleted()))
    }
}
