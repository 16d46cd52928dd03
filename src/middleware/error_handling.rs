use crate::error::AppError;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Wire shape for every failure response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub error_type: String,
    pub code: String,
}

/// Map domain errors to HTTP responses. Each failure class stays
/// distinguishable so clients can react (redirect vs inline error).
pub fn map_error(err: &AppError) -> (StatusCode, ErrorResponse) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let (error_type, code) = match err {
        AppError::Validation(_) => ("validation_error", "INVALID_REQUEST"),
        AppError::Unauthorized => ("authentication_error", "INVALID_CREDENTIALS"),
        AppError::Forbidden => ("authorization_error", "NOT_PARTICIPANT"),
        AppError::NotFound => ("not_found_error", "RESOURCE_NOT_FOUND"),
        AppError::Conflict => ("conflict_error", "DUPLICATE_CONVERSATION"),
        AppError::Config(_) | AppError::StartServer(_) => {
            ("server_error", "INTERNAL_SERVER_ERROR")
        }
        AppError::Database(_) => ("server_error", "DATABASE_ERROR"),
        AppError::Internal => ("server_error", "INTERNAL_SERVER_ERROR"),
    };

    // Storage failures are logged with detail but surfaced opaque.
    let message = match err {
        AppError::Database(e) => {
            tracing::error!(error = %e, "database failure");
            "internal server error".to_string()
        }
        other => other.to_string(),
    };

    let response = ErrorResponse {
        error: match status {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::CONFLICT => "Conflict",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
        .to_string(),
        message,
        status: status.as_u16(),
        error_type: error_type.to_string(),
        code: code.to_string(),
    };

    (status, response)
}

pub fn into_response(err: AppError) -> impl IntoResponse {
    let (status, response) = map_error(&err);
    (status, Json(response))
}
