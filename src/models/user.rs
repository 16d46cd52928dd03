use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public identity fields exposed in caller-relative projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub avatar: Option<String>,
}
