use crate::middleware::guards::User;
use crate::models::conversation::ConversationView;
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

const DEFAULT_CONVERSATION_PAGE_SIZE: u32 = 20;

#[derive(Deserialize)]
pub struct StartConversationRequest {
    pub product_id: Uuid,
    pub receiver_id: Uuid,
    pub initial_message: Option<String>,
}

#[derive(Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationView>,
    pub page: u32,
    pub page_size: u32,
}

/// POST /conversations
/// Idempotent: repeated starts for the same pair and product return the
/// existing conversation.
pub async fn start_conversation(
    State(state): State<AppState>,
    user: User,
    Json(body): Json<StartConversationRequest>,
) -> Result<Json<ConversationView>, crate::error::AppError> {
    let view = ChatService::start_conversation(
        &state.db,
        user.id,
        body.product_id,
        body.receiver_id,
        body.initial_message,
    )
    .await?;
    Ok(Json(view))
}

/// GET /conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    user: User,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ConversationListResponse>, crate::error::AppError> {
    let (limit, offset) =
        pagination.window(DEFAULT_CONVERSATION_PAGE_SIZE, state.config.max_page_size);
    let conversations = ChatService::list_conversations(&state.db, user.id, limit, offset).await?;

    Ok(Json(ConversationListResponse {
        conversations,
        page: pagination.page.unwrap_or(1).max(1),
        page_size: limit as u32,
    }))
}

/// GET /conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationView>, crate::error::AppError> {
    let view = ChatService::get_conversation(&state.db, user.id, id).await?;
    Ok(Json(view))
}

/// POST /conversations/{id}/read
pub async fn mark_as_read(
    State(state): State<AppState>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, crate::error::AppError> {
    ChatService::mark_read(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /conversations/{id}
/// Hard delete; messages cascade with the conversation row.
pub async fn delete_conversation(
    State(state): State<AppState>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, crate::error::AppError> {
    ChatService::delete_conversation(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /conversations/{id}/block
pub async fn block_conversation(
    State(state): State<AppState>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, crate::error::AppError> {
    ChatService::block(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /conversations/{id}/unblock
pub async fn unblock_conversation(
    State(state): State<AppState>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, crate::error::AppError> {
    ChatService::unblock(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
