use axum::{extract::State, response::IntoResponse, Extension, Json};

use crate::error::{ApiResponse, Result};
use crate::models::{CurrentUser, LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use crate::services::AuthService;
use crate::AppState;

/// Register a new user
/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = AuthService::register(&state.db, req).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// Login user
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let response = AuthService::login(&state.db, &state.config, req).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Logout user
/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    AuthService::logout(&state.db, &current_user.id).await?;
    Ok(Json(ApiResponse::<()>::success_message("Logged out successfully")))
}
