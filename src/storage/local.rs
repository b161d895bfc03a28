use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::StorageMode;
use crate::error::{AppError, Result};
use crate::models::{Scope, StoredEntry};
use crate::storage::StorageProvider;

/// Local file system storage provider
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn scope_path(&self, scope: &Scope) -> PathBuf {
        match scope {
            Scope::Root => self.base_path.clone(),
            Scope::Folder(name) => self.base_path.join(name),
        }
    }

    fn map_missing(scope: &Scope, e: std::io::Error) -> AppError {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::InvalidScopeName(scope.to_string())
        } else {
            AppError::Storage(format!("Failed to read folder {}: {}", scope, e))
        }
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    async fn list(&self, scope: &Scope) -> Result<Vec<StoredEntry>> {
        let dir = self.scope_path(scope);
        let mut read_dir = fs::read_dir(&dir)
            .await
            .map_err(|e| Self::map_missing(scope, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read folder {}: {}", scope, e)))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                // Removed since read_dir saw it
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(AppError::Storage(format!(
                        "Failed to stat {} in {}: {}",
                        name, scope, e
                    )))
                }
            };
            if metadata.is_dir() {
                entries.push(StoredEntry::dir(name));
            } else {
                let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
                entries.push(StoredEntry::file(name, modified));
            }
        }

        // read_dir order is unspecified
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn put(&self, scope: &Scope, name: &str, data: Bytes) -> Result<()> {
        let dir = self.scope_path(scope);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(AppError::InvalidScopeName(scope.to_string()));
        }

        let full_path = dir.join(name);
        let write = async {
            let mut file = fs::File::create(&full_path).await?;
            file.write_all(&data).await?;
            file.flush().await
        };
        write.await.map_err(|e| {
            AppError::Storage(format!("Failed to write {:?}: {}", full_path, e))
        })?;

        tracing::debug!("Saved file to {:?}", full_path);
        Ok(())
    }

    async fn delete(&self, scope: &Scope, name: &str) -> Result<()> {
        let full_path = self.scope_path(scope).join(name);

        match fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!("Deleted file {:?}", full_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete {:?}: {}",
                full_path, e
            ))),
        }
    }

    async fn create_folder(&self, name: &str) -> Result<()> {
        let path = self.base_path.join(name);
        match fs::create_dir(&path).await {
            Ok(()) => {
                tracing::info!("Created folder {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(AppError::FolderAlreadyExists(name.to_string()))
            }
            Err(e) => Err(AppError::Storage(format!(
                "Failed to create folder {:?}: {}",
                path, e
            ))),
        }
    }

    fn photo_url(&self, _scope: &Scope, _name: &str) -> Option<String> {
        // Served by the application from the upload directory
        None
    }

    fn mode(&self) -> StorageMode {
        StorageMode::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.put(&Scope::Root, "b.jpg", Bytes::from_static(b"b")).await.unwrap();
        storage.put(&Scope::Root, "a.jpg", Bytes::from_static(b"a")).await.unwrap();
        storage.create_folder("pups").await.unwrap();

        let entries = storage.list(&Scope::Root).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "pups"]);
        assert!(entries[2].is_dir);
        assert!(entries[0].modified.is_some());

        storage.delete(&Scope::Root, "a.jpg").await.unwrap();
        // deleting twice is not an error
        storage.delete(&Scope::Root, "a.jpg").await.unwrap();
        assert_eq!(storage.list(&Scope::Root).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_folder_is_invalid_scope() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let scope = Scope::Folder("nope".to_string());

        assert!(matches!(
            storage.list(&scope).await,
            Err(AppError::InvalidScopeName(_))
        ));
        assert!(matches!(
            storage.put(&scope, "a.jpg", Bytes::new()).await,
            Err(AppError::InvalidScopeName(_))
        ));
    }

    #[tokio::test]
    async fn test_create_folder_twice() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.create_folder("pups").await.unwrap();
        assert!(matches!(
            storage.create_folder("pups").await,
            Err(AppError::FolderAlreadyExists(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_list_survives_concurrent_deletes() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..400 {
            std::fs::write(dir.path().join(format!("pup{}.jpg", i)), b"x").unwrap();
        }
        let storage = LocalStorage::new(dir.path());

        let base = dir.path().to_path_buf();
        let deleter = tokio::task::spawn_blocking(move || {
            for i in 0..400 {
                std::fs::remove_file(base.join(format!("pup{}.jpg", i))).unwrap();
            }
        });

        while !deleter.is_finished() {
            let entries = storage.list(&Scope::Root).await.unwrap();
            assert!(entries.len() <= 400);
        }
        deleter.await.unwrap();
        assert!(storage.list(&Scope::Root).await.unwrap().is_empty());
    }
}
