use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{ResourceKind, ResourceRecordsRequest, ResourceRecordsResponse};
use crate::services::ResourceService;
use crate::AppState;

/// Reshape resource records for display
/// POST /api/v1/resources/:kind
pub async fn reshape_resources(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(req): Json<ResourceRecordsRequest>,
) -> Result<Json<ApiResponse<ResourceRecordsResponse>>> {
    let kind = ResourceKind::from_str(&kind)
        .ok_or_else(|| AppError::NotFound(format!("Unknown resource {}", kind)))?;

    tracing::debug!("Reshaping {} {} record(s)", req.records.len(), kind.as_str());
    let records =
        ResourceService::reshape(kind, req.records, &state.config.resources.no_photo_url);
    Ok(Json(ApiResponse::success(ResourceRecordsResponse { kind, records })))
}
