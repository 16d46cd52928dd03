use crate::state::AppState;
use axum::middleware;
use axum::{
    routing::{get, post},
    Router,
};
use serde::Deserialize;

pub mod conversations;
use conversations::{
    block_conversation, delete_conversation, get_conversation, list_conversations, mark_as_read,
    start_conversation, unblock_conversation,
};
pub mod messages;
use messages::{get_message_history, send_message};

/// Offset pagination over a stable ordering key.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl Pagination {
    /// Resolve to a (limit, offset) window. Page numbering is 1-based;
    /// sizes are clamped to the configured cap.
    pub fn window(&self, default_size: u32, max_size: u32) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let size = self.page_size.unwrap_or(default_size).clamp(1, max_size);
        (size as i64, (page as i64 - 1) * size as i64)
    }
}

pub fn build_router() -> Router<AppState> {
    // Liveness stays public for healthchecks
    let introspection = Router::new().route("/health", get(|| async { "OK" }));

    let api_v1 = Router::new()
        .route(
            "/conversations",
            post(start_conversation).get(list_conversations),
        )
        .route(
            "/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
        .route(
            "/conversations/:id/messages",
            post(send_message).get(get_message_history),
        )
        .route("/conversations/:id/read", post(mark_as_read))
        .route("/conversations/:id/block", post(block_conversation))
        .route("/conversations/:id/unblock", post(unblock_conversation));

    let secured_api_v1 = api_v1.layer(middleware::from_fn(
        crate::middleware::auth::auth_middleware,
    ));

    let router = introspection.merge(Router::new().nest("/api/v1", secured_api_v1));

    crate::middleware::with_defaults(router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_to_first_page() {
        let p = Pagination {
            page: None,
            page_size: None,
        };
        assert_eq!(p.window(20, 100), (20, 0));
    }

    #[test]
    fn pagination_clamps_size_and_floors_page() {
        let p = Pagination {
            page: Some(0),
            page_size: Some(500),
        };
        assert_eq!(p.window(20, 100), (100, 0));

        let p = Pagination {
            page: Some(3),
            page_size: Some(2),
        };
        assert_eq!(p.window(20, 100), (2, 4));
    }
}
