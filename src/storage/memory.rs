//! In-memory provider used by service tests

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::config::StorageMode;
use crate::error::{AppError, Result};
use crate::models::{PresignedUpload, Scope, StoredEntry};
use crate::storage::StorageProvider;

/// Flat object store behaving like the bucket backend
pub struct MemoryBucket {
    objects: Mutex<BTreeMap<String, DateTime<Utc>>>,
    fail_puts_after: Mutex<Option<usize>>,
    clock: Mutex<i64>,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            fail_puts_after: Mutex::new(None),
            clock: Mutex::new(0),
        }
    }

    pub fn with_objects(names: &[&str]) -> Self {
        let bucket = Self::new();
        for name in names {
            bucket.insert(name);
        }
        bucket
    }

    pub fn insert(&self, name: &str) {
        let modified = self.tick();
        self.objects
            .lock()
            .unwrap()
            .insert(name.to_string(), modified);
    }

    /// Let `n` more puts succeed, then fail every put after that
    pub fn fail_puts_after(&self, n: usize) {
        *self.fail_puts_after.lock().unwrap() = Some(n);
    }

    pub fn names(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    fn tick(&self) -> DateTime<Utc> {
        let mut clock = self.clock.lock().unwrap();
        *clock += 1;
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(*clock)
    }
}

#[async_trait]
impl StorageProvider for MemoryBucket {
    async fn list(&self, scope: &Scope) -> Result<Vec<StoredEntry>> {
        if let Scope::Folder(name) = scope {
            return Err(AppError::InvalidScopeName(name.clone()));
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|(name, modified)| StoredEntry::file(name.clone(), Some(*modified)))
            .collect())
    }

    async fn put(&self, scope: &Scope, name: &str, _data: Bytes) -> Result<()> {
        if let Scope::Folder(folder) = scope {
            return Err(AppError::InvalidScopeName(folder.clone()));
        }
        {
            let mut remaining = self.fail_puts_after.lock().unwrap();
            match remaining.as_mut() {
                Some(0) => return Err(AppError::Storage("bucket unavailable".to_string())),
                Some(n) => *n -= 1,
                None => {}
            }
        }
        self.insert(name);
        Ok(())
    }

    async fn delete(&self, _scope: &Scope, name: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(name);
        Ok(())
    }

    async fn create_folder(&self, _name: &str) -> Result<()> {
        Err(AppError::BadRequest(
            "Folders are not supported with bucket storage".to_string(),
        ))
    }

    fn photo_url(&self, scope: &Scope, name: &str) -> Option<String> {
        match scope {
            Scope::Root => Some(format!("https://pups.s3.us-east-2.amazonaws.com/{}", name)),
            Scope::Folder(_) => None,
        }
    }

    fn presigned_upload(&self, name: &str, content_type: &str) -> Result<PresignedUpload> {
        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), name.to_string());
        fields.insert("Content-Type".to_string(), content_type.to_string());
        Ok(PresignedUpload {
            upload_url: "https://pups.s3.us-east-2.amazonaws.com/".to_string(),
            fields,
            url: format!("https://pups.s3.us-east-2.amazonaws.com/{}", name),
        })
    }

    fn mode(&self) -> StorageMode {
        StorageMode::Bucket
    }
}
