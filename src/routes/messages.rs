use crate::middleware::guards::User;
use crate::models::message::{MessageKind, MessageView};
use crate::routes::Pagination;
use crate::services::chat_service::ChatService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_MESSAGE_PAGE_SIZE: u32 = 50;

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
    #[serde(default)]
    pub kind: MessageKind,
}

#[derive(Serialize)]
pub struct MessageHistoryResponse {
    pub messages: Vec<MessageView>,
    pub total: i64,
    pub page: u32,
    pub total_pages: i64,
}

/// POST /conversations/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    user: User,
    Path(id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageView>), crate::error::AppError> {
    let view = ChatService::send_message(&state.db, user.id, id, &body.text, body.kind).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /conversations/{id}/messages
/// Oldest-first, windowed over the (created_at, id) ordering key.
pub async fn get_message_history(
    State(state): State<AppState>,
    user: User,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<MessageHistoryResponse>, crate::error::AppError> {
    let (limit, offset) =
        pagination.window(DEFAULT_MESSAGE_PAGE_SIZE, state.config.max_page_size);
    let (messages, total) = ChatService::history(&state.db, user.id, id, limit, offset).await?;

    let total_pages = if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    };

    Ok(Json(MessageHistoryResponse {
        messages,
        total,
        page: pagination.page.unwrap_or(1).max(1),
        total_pages,
    }))
}
