use crate::error::AppError;
use uuid::Uuid;

/// Header carrying the gateway-verified requester identity. Token
/// verification happens at the edge; this service only trusts the resolved
/// id forwarded on the internal network.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware to resolve the requester identity and add it to extensions.
pub async fn auth_middleware(
    mut req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<axum::response::Response, AppError> {
    let raw = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let user_id = parse_user_id(raw)?;

    req.extensions_mut().insert(user_id);

    Ok(next.run(req).await)
}

pub fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Unauthorized)
}
