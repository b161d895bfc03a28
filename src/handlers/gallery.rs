use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{GalleryResponse, PhotoView};
use crate::services::GalleryService;
use crate::AppState;

/// Where rejected subfolder requests are sent
pub const GALLERY_ROOT: &str = "/api/v1/gallery";

/// Root gallery
/// GET /api/v1/gallery
pub async fn get_gallery(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GalleryResponse>>> {
    let listing = GalleryService::list_gallery(state.storage.provider(), None).await?;
    Ok(Json(ApiResponse::success(GalleryService::present(listing))))
}

/// Gallery of one folder
/// GET /api/v1/gallery/:subfolder
pub async fn get_subfolder_gallery(
    State(state): State<AppState>,
    Path(subfolder): Path<String>,
) -> Result<Response> {
    match GalleryService::list_gallery(state.storage.provider(), Some(&subfolder)).await {
        Ok(listing) => {
            Ok(Json(ApiResponse::success(GalleryService::present(listing))).into_response())
        }
        Err(AppError::InvalidScopeName(name)) => {
            tracing::warn!("Redirecting gallery request for {:?}", name);
            Ok(Redirect::to(GALLERY_ROOT).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Public photo feed
/// GET /api/v1/feed
pub async fn get_feed(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<PhotoView>>>> {
    let photos = GalleryService::feed(state.storage.provider()).await?;
    Ok(Json(ApiResponse::success(photos)))
}
