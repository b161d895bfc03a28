use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use crate::config::{BucketConfig, StorageMode};
use crate::error::{AppError, Result};
use crate::models::{PresignedUpload, Scope, StoredEntry};
use crate::storage::StorageProvider;

use super::client::Client;
use super::objects::content_type_for;
use super::signer::encode_key;

/// S3 bucket storage provider
///
/// The bucket is one flat namespace, so only the root scope exists.
pub struct S3Storage {
    client: Client,
    public_base_url: String,
}

impl S3Storage {
    pub fn new(config: &BucketConfig) -> Self {
        let client = Client::new(config);
        let public_base_url = config
            .public_base_url
            .clone()
            .unwrap_or_else(|| client.default_public_base_url());
        Self {
            client,
            public_base_url,
        }
    }

    fn key<'a>(scope: &Scope, name: &'a str) -> Result<&'a str> {
        match scope {
            Scope::Root => Ok(name),
            Scope::Folder(folder) => Err(AppError::InvalidScopeName(folder.clone())),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), encode_key(key))
    }
}

#[async_trait]
impl StorageProvider for S3Storage {
    async fn list(&self, scope: &Scope) -> Result<Vec<StoredEntry>> {
        Self::key(scope, "")?;
        let objects = self.client.list_objects().await?;
        Ok(objects
            .into_iter()
            .map(|o| StoredEntry::file(o.key, o.last_modified))
            .collect())
    }

    async fn put(&self, scope: &Scope, name: &str, data: Bytes) -> Result<()> {
        let key = Self::key(scope, name)?;
        self.client
            .put_object(key, data, &content_type_for(key))
            .await?;
        tracing::info!("Successfully uploaded to bucket {}: {}", self.client.bucket(), key);
        Ok(())
    }

    async fn delete(&self, scope: &Scope, name: &str) -> Result<()> {
        let key = Self::key(scope, name)?;
        self.client.delete_object(key).await
    }

    async fn create_folder(&self, _name: &str) -> Result<()> {
        Err(AppError::BadRequest(
            "Folders are not supported with bucket storage".to_string(),
        ))
    }

    fn photo_url(&self, scope: &Scope, name: &str) -> Option<String> {
        Self::key(scope, name).ok().map(|key| self.object_url(key))
    }

    fn presigned_upload(&self, name: &str, content_type: &str) -> Result<PresignedUpload> {
        let fields = self.client.post_policy_fields(name, content_type, Utc::now());
        Ok(PresignedUpload {
            upload_url: self.client.default_public_base_url(),
            fields,
            url: self.object_url(name),
        })
    }

    fn mode(&self) -> StorageMode {
        StorageMode::Bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(public_base_url: Option<&str>) -> BucketConfig {
        BucketConfig {
            bucket: "puploader".to_string(),
            region: "us-east-2".to_string(),
            endpoint: None,
            access_key_id: "AKID".to_string(),
            secret_access_key: "secret".to_string(),
            public_base_url: public_base_url.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_photo_url_is_fully_qualified() {
        let storage = S3Storage::new(&config(None));
        assert_eq!(
            storage.photo_url(&Scope::Root, "rex.jpg").unwrap(),
            "https://puploader.s3.us-east-2.amazonaws.com/rex.jpg"
        );
        assert!(storage
            .photo_url(&Scope::Folder("pups".to_string()), "rex.jpg")
            .is_none());
    }

    #[test]
    fn test_custom_public_base_url() {
        let storage = S3Storage::new(&config(Some("https://cdn.example.com/pups/")));
        assert_eq!(
            storage.photo_url(&Scope::Root, "rex.jpg").unwrap(),
            "https://cdn.example.com/pups/rex.jpg"
        );
    }

    #[tokio::test]
    async fn test_folders_are_rejected() {
        let storage = S3Storage::new(&config(None));
        let scope = Scope::Folder("pups".to_string());
        assert!(matches!(
            storage.list(&scope).await,
            Err(AppError::InvalidScopeName(_))
        ));
        assert!(matches!(
            storage.put(&scope, "rex.jpg", Bytes::new()).await,
            Err(AppError::InvalidScopeName(_))
        ));
        assert!(matches!(
            storage.create_folder("pups").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_presigned_upload() {
        let storage = S3Storage::new(&config(None));
        let upload = storage.presigned_upload("rex.jpg", "image/jpeg").unwrap();
        assert_eq!(
            upload.upload_url,
            "https://puploader.s3.us-east-2.amazonaws.com/"
        );
        assert_eq!(
            upload.url,
            "https://puploader.s3.us-east-2.amazonaws.com/rex.jpg"
        );
        assert_eq!(upload.fields["acl"], "public-read");
    }
}
