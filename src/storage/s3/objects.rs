//! Object operations: list, upload, delete

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::storage::s3::client::Client;
use crate::storage::s3::signer::{sha256_hex, Signer, EMPTY_PAYLOAD_SHA256};

/// One object from a bucket listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a ListObjectsV2 response
#[derive(Debug, Default, PartialEq, Eq)]
struct ListPage {
    objects: Vec<ObjectSummary>,
    next_token: Option<String>,
}

impl Client {
    /// List every object in the bucket, following continuation tokens
    pub async fn list_objects(&self) -> Result<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let bucket_path = self.bucket_path();
            let mut signer = Signer::new("GET", &bucket_path, EMPTY_PAYLOAD_SHA256)
                .query("list-type", "2");
            if let Some(ref t) = token {
                signer = signer.query("continuation-token", t);
            }
            let query = signer.canonical_query();
            let headers = self.signed_headers(signer, EMPTY_PAYLOAD_SHA256, &[])?;

            let resp = self
                .http()
                .get(self.url_for(&bucket_path, &query))
                .headers(headers)
                .send()
                .await
                .map_err(|e| AppError::Storage(format!("S3 list request failed: {}", e)))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(AppError::Storage(format!(
                    "S3 list failed: HTTP {} - {}",
                    status, body
                )));
            }

            let body = resp
                .text()
                .await
                .map_err(|e| AppError::Storage(format!("Failed to read S3 list response: {}", e)))?;
            let page = parse_list_page(&body)?;
            objects.extend(page.objects);

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        tracing::debug!(bucket = %self.bucket(), count = objects.len(), "S3 list complete");
        Ok(objects)
    }

    /// Upload an object
    pub async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        let path = self.object_path(key);
        let payload_hash = sha256_hex(&data);
        let signer = Signer::new("PUT", &path, &payload_hash);
        let headers = self.signed_headers(
            signer,
            &payload_hash,
            &[("content-type", content_type.to_string())],
        )?;

        let resp = self
            .http()
            .put(self.url_for(&path, ""))
            .headers(headers)
            .body(data)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "S3 upload of {} failed: HTTP {} - {}",
                key, status, body
            )));
        }

        tracing::debug!(key = %key, "S3 upload complete");
        Ok(())
    }

    /// Delete an object, a missing object is not an error
    pub async fn delete_object(&self, key: &str) -> Result<()> {
        let path = self.object_path(key);
        let signer = Signer::new("DELETE", &path, EMPTY_PAYLOAD_SHA256);
        let headers = self.signed_headers(signer, EMPTY_PAYLOAD_SHA256, &[])?;

        let resp = self
            .http()
            .delete(self.url_for(&path, ""))
            .headers(headers)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete request failed: {}", e)))?;

        if !resp.status().is_success() && resp.status().as_u16() != 404 {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "S3 delete of {} failed: HTTP {} - {}",
                key, status, body
            )));
        }

        tracing::debug!(key = %key, "S3 delete complete");
        Ok(())
    }
}

/// Content type sent with an upload
pub fn content_type_for(key: &str) -> String {
    mime_guess::from_path(key)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// ListObjectsV2 response body
#[derive(Debug, Deserialize)]
struct ListBucketResult {
    #[serde(rename(deserialize = "Contents"), default)]
    contents: Vec<ListContents>,
    #[serde(rename(deserialize = "IsTruncated"), default)]
    is_truncated: bool,
    #[serde(rename(deserialize = "NextContinuationToken"), default)]
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListContents {
    #[serde(rename(deserialize = "Key"))]
    key: String,
    #[serde(rename(deserialize = "LastModified"), default)]
    last_modified: Option<String>,
}

fn parse_list_page(xml: &str) -> Result<ListPage> {
    let result = quick_xml::de::from_reader::<&[u8], ListBucketResult>(xml.as_bytes())
        .map_err(|e| AppError::Storage(format!("Failed to decode S3 list response: {}", e)))?;

    let objects = result
        .contents
        .into_iter()
        .map(|c| ObjectSummary {
            key: c.key,
            last_modified: c.last_modified.and_then(|v| {
                DateTime::parse_from_rfc3339(&v)
                    .ok()
                    .map(|d| d.with_timezone(&Utc))
            }),
        })
        .collect();

    let next_token = if result.is_truncated {
        result.next_continuation_token
    } else {
        None
    };

    Ok(ListPage { objects, next_token })
}
