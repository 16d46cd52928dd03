use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing summary denormalized into conversation projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: Uuid,
    pub title: String,
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub status: String,
}

impl ProductSummary {
    pub fn is_deleted(&self) -> bool {
        self.status == "deleted"
    }
}
