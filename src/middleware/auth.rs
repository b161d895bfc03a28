use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::AppState;

/// Authentication middleware
/// Extracts and validates JWT from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized("Missing or invalid Authorization header".to_string())
        })?;

    let claims = AuthService::validate_token(token, &state.config)?;

    let (email, token_version): (String, i64) =
        sqlx::query_as("SELECT email, token_version FROM users WHERE id = ?")
            .bind(&claims.sub)
            .fetch_optional(state.db.pool())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

    // Logout bumps the version
    if token_version != claims.ver {
        return Err(AppError::Unauthorized("Session expired".to_string()));
    }

    request.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        email,
    });

    Ok(next.run(request).await)
}
