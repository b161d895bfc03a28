use async_trait::async_trait;
use bytes::Bytes;

use crate::config::StorageMode;
use crate::error::{AppError, Result};
use crate::models::{PresignedUpload, Scope, StoredEntry};

/// Storage provider trait
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// List the entries of a scope
    async fn list(&self, scope: &Scope) -> Result<Vec<StoredEntry>>;

    /// Store data under `name` inside `scope`
    async fn put(&self, scope: &Scope, name: &str, data: Bytes) -> Result<()>;

    /// Remove `name` from `scope`
    async fn delete(&self, scope: &Scope, name: &str) -> Result<()>;

    /// Create an empty folder scope
    async fn create_folder(&self, name: &str) -> Result<()>;

    /// Fully qualified retrieval URL, `None` when the caller serves the file itself
    fn photo_url(&self, scope: &Scope, name: &str) -> Option<String>;

    /// Signed form for uploading `name` straight from the browser
    fn presigned_upload(&self, _name: &str, _content_type: &str) -> Result<PresignedUpload> {
        Err(AppError::BadRequest(
            "Direct uploads are only available with bucket storage".to_string(),
        ))
    }

    fn mode(&self) -> StorageMode;
}
