use axum::{
    extract::{Multipart, Query, State},
    Extension, Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{
    CreateFolderRequest, CurrentUser, FolderListResponse, FolderResponse, PresignedUpload,
    SignUploadQuery, UploadFile, UploadReport, DEFAULT_FOLDER,
};
use crate::services::PhotoService;
use crate::AppState;

/// Upload photos
/// POST /api/v1/photos/upload
///
/// Multipart fields: any number of `files` and an optional `folder`.
pub async fn upload_photos(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadReport>>> {
    let mut files = Vec::new();
    let mut folder = DEFAULT_FOLDER.to_string();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to process multipart: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "files" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file: {}", e))
                })?;
                files.push(UploadFile::new(file_name, data));
            }
            "folder" | "folder_dropdown" => {
                let text = field.text().await.unwrap_or_default();
                if !text.trim().is_empty() {
                    folder = text;
                }
            }
            _ => {}
        }
    }

    tracing::debug!(
        "{} uploading {} file(s) to {:?}",
        current_user.email,
        files.len(),
        folder
    );

    let report = PhotoService::intake(
        &state.storage,
        files,
        &folder,
        state.config.storage.retention_cap(),
    )
    .await?;

    Ok(Json(ApiResponse::success_with_message(
        "File(s) uploaded successfully!",
        report,
    )))
}

/// Sign a browser-direct bucket upload
/// GET /api/v1/photos/sign?file_name=..&file_type=..
pub async fn sign_upload(
    State(state): State<AppState>,
    Query(query): Query<SignUploadQuery>,
) -> Result<Json<ApiResponse<PresignedUpload>>> {
    let upload = PhotoService::sign_upload(&state.storage, &query.file_name, &query.file_type)?;
    Ok(Json(ApiResponse::success(upload)))
}

/// List upload folders
/// GET /api/v1/folders
pub async fn list_folders(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FolderListResponse>>> {
    let folders = PhotoService::list_folders(&state.storage).await?;
    Ok(Json(ApiResponse::success(FolderListResponse { folders })))
}

/// Create an upload folder
/// POST /api/v1/folders
pub async fn create_folder(
    State(state): State<AppState>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Json<ApiResponse<FolderResponse>>> {
    let name =
        PhotoService::create_folder(&state.storage, &req.name, state.config.storage.private).await?;
    let message = format!("New folder {} created!", name);
    Ok(Json(ApiResponse::success_with_message(
        &message,
        FolderResponse { name },
    )))
}
