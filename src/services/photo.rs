use std::collections::BTreeSet;

use crate::config::StorageMode;
use crate::error::{AppError, Result};
use crate::models::{
    FileOutcome, PresignedUpload, Scope, UploadFile, UploadReport, DEFAULT_FOLDER,
};
use crate::services::naming::{
    is_allowed_extension, resolve_unique_name, sanitize_folder_name, secure_filename,
};
use crate::services::RetentionService;
use crate::storage::StorageManager;

/// Photo upload and folder service
pub struct PhotoService;

impl PhotoService {
    /// Scope an upload targets
    ///
    /// `default` means the root. Bucket storage has no folders, so every
    /// upload goes to the root there.
    pub fn upload_scope(folder: &str, mode: StorageMode) -> Result<Scope> {
        let folder = folder.trim();
        if mode == StorageMode::Bucket
            || folder.is_empty()
            || folder.eq_ignore_ascii_case(DEFAULT_FOLDER)
        {
            return Ok(Scope::Root);
        }
        Ok(Scope::Folder(sanitize_folder_name(folder)?))
    }

    /// Store a batch of uploaded photos
    ///
    /// Files with unusable names or disallowed extensions are skipped. The
    /// first storage failure aborts the rest of the batch; files stored
    /// before it are kept.
    pub async fn intake(
        storage: &StorageManager,
        files: Vec<UploadFile>,
        folder: &str,
        max_count: Option<usize>,
    ) -> Result<UploadReport> {
        match files.first() {
            Some(first) if !first.file_name.is_empty() => {}
            _ => return Err(AppError::NoFileSelected),
        }

        let mode = storage.mode();
        let scope = Self::upload_scope(folder, mode)?;
        let provider = storage.provider();

        let _guard = storage.lock_scope(&scope).await;

        let listing = provider.list(&scope).await?;
        let mut file_count = listing.iter().filter(|e| !e.is_dir).count();
        let mut existing: BTreeSet<String> = listing.into_iter().map(|e| e.name).collect();

        let cap = match mode {
            StorageMode::Local => max_count.filter(|max| *max > 0),
            StorageMode::Bucket => None,
        };

        let mut report = UploadReport {
            stored: 0,
            evicted: Vec::new(),
            files: Vec::with_capacity(files.len()),
        };

        for file in files {
            let original = file.file_name;

            let Some(clean) = secure_filename(&original) else {
                tracing::warn!("Skipping upload with unusable name {:?}", original);
                report.files.push(FileOutcome::Skipped {
                    original,
                    reason: "Invalid file name".to_string(),
                });
                continue;
            };

            if !is_allowed_extension(&clean) {
                tracing::warn!("Skipping {:?}: file type not allowed", original);
                report.files.push(FileOutcome::Skipped {
                    original,
                    reason: "File type not allowed".to_string(),
                });
                continue;
            }

            let name = resolve_unique_name(&clean, &existing);

            if let Some(max) = cap {
                if file_count >= max {
                    let evicted = RetentionService::evict(provider, &scope, max - 1).await?;
                    for victim in &evicted {
                        existing.remove(victim);
                    }
                    file_count = file_count.saturating_sub(evicted.len());
                    report.evicted.extend(evicted);
                }
            }

            provider.put(&scope, &name, file.data).await?;
            tracing::info!("Stored {} in {}", name, scope);

            existing.insert(name.clone());
            file_count += 1;
            report.files.push(FileOutcome::Stored {
                original,
                stored_as: name,
            });
        }

        report.stored = report.files.iter().filter(|f| f.is_stored()).count();
        Ok(report)
    }

    /// Create a new upload folder
    pub async fn create_folder(storage: &StorageManager, raw_name: &str, private: bool) -> Result<String> {
        if !private {
            return Err(AppError::Forbidden(
                "Sorry, new folder creation is disabled while running publicly!".to_string(),
            ));
        }

        let name = sanitize_folder_name(raw_name)?;
        let scope = Scope::Folder(name.clone());
        let _guard = storage.lock_scope(&scope).await;

        storage.provider().create_folder(&name).await?;
        tracing::info!("Created folder {}", name);
        Ok(name)
    }

    /// Folder names available as upload targets, sorted
    pub async fn list_folders(storage: &StorageManager) -> Result<Vec<String>> {
        if storage.mode() == StorageMode::Bucket {
            return Ok(Vec::new());
        }

        let mut folders: Vec<String> = storage
            .provider()
            .list(&Scope::Root)
            .await?
            .into_iter()
            .filter(|e| e.is_dir)
            .map(|e| e.name)
            .collect();
        folders.sort();
        Ok(folders)
    }

    /// Presigned form for uploading one photo straight to the bucket
    pub fn sign_upload(storage: &StorageManager, file_name: &str, file_type: &str) -> Result<PresignedUpload> {
        let name = secure_filename(file_name)
            .ok_or_else(|| AppError::BadRequest("Invalid file name".to_string()))?;
        storage.provider().presigned_upload(&name, file_type)
    }
}
