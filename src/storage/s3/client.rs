//! S3 client: addressing, credentials and signed request construction

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use std::str::FromStr;

use crate::config::BucketConfig;
use crate::error::{AppError, Result};
use crate::storage::s3::signer::{encode_key, Signer};

/// S3 client
#[derive(Debug, Clone)]
pub struct Client {
    bucket: String,
    region: String,
    endpoint: Option<String>,
    access_key_id: String,
    secret_access_key: String,
    http: reqwest::Client,
}

impl Client {
    pub fn new(config: &BucketConfig) -> Self {
        Self {
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint: config
                .endpoint
                .as_ref()
                .map(|e| e.trim_end_matches('/').to_string()),
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            http: reqwest::Client::new(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Scheme and host the requests go to
    fn origin(&self) -> (&str, String) {
        match &self.endpoint {
            Some(endpoint) => {
                if let Some(host) = endpoint.strip_prefix("http://") {
                    ("http", host.to_string())
                } else {
                    let host = endpoint.strip_prefix("https://").unwrap_or(endpoint);
                    ("https", host.to_string())
                }
            }
            None => (
                "https",
                format!("{}.s3.{}.amazonaws.com", self.bucket, self.region),
            ),
        }
    }

    /// Host header value
    pub fn host(&self) -> String {
        self.origin().1
    }

    /// Path of the bucket itself: `/` virtual-hosted, `/<bucket>` path-style
    pub fn bucket_path(&self) -> String {
        if self.endpoint.is_some() {
            format!("/{}", self.bucket)
        } else {
            "/".to_string()
        }
    }

    /// Path of an object, already encoded
    pub fn object_path(&self, key: &str) -> String {
        let key = encode_key(key.trim_start_matches('/'));
        if self.endpoint.is_some() {
            format!("/{}/{}", self.bucket, key)
        } else {
            format!("/{}", key)
        }
    }

    pub fn url_for(&self, path: &str, query: &str) -> String {
        let (scheme, host) = self.origin();
        if query.is_empty() {
            format!("{}://{}{}", scheme, host, path)
        } else {
            format!("{}://{}{}?{}", scheme, host, path, query)
        }
    }

    /// URL objects are readable from when no public base URL is configured
    pub fn default_public_base_url(&self) -> String {
        let base = self.url_for(&self.bucket_path(), "");
        format!("{}/", base.trim_end_matches('/'))
    }

    /// Sign a request and return the headers to send with it
    ///
    /// `extra` headers are signed too and must be sent verbatim.
    pub fn signed_headers(
        &self,
        signer: Signer<'_>,
        payload_hash: &str,
        extra: &[(&str, String)],
    ) -> Result<HeaderMap> {
        let date_time = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

        let mut signer = signer
            .header("host", &self.host())
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", &date_time);
        for (name, value) in extra {
            signer = signer.header(name, value);
        }

        let auth = signer.authorization(
            &self.access_key_id,
            &self.secret_access_key,
            &self.region,
            &date_time,
        );

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "x-amz-content-sha256", payload_hash)?;
        insert_header(&mut headers, "x-amz-date", &date_time)?;
        for (name, value) in extra {
            insert_header(&mut headers, name, value)?;
        }
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| AppError::Storage(format!("Invalid authorization header: {}", e)))?,
        );
        Ok(headers)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_str(name)
        .map_err(|e| AppError::Storage(format!("Invalid header name {}: {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| AppError::Storage(format!("Invalid header value for {}: {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: Option<&str>) -> BucketConfig {
        BucketConfig {
            bucket: "puploader".to_string(),
            region: "us-east-2".to_string(),
            endpoint: endpoint.map(|e| e.to_string()),
            access_key_id: "AKID".to_string(),
            secret_access_key: "secret".to_string(),
            public_base_url: None,
        }
    }

    #[test]
    fn test_virtual_hosted_addressing() {
        let client = Client::new(&config(None));
        assert_eq!(client.host(), "puploader.s3.us-east-2.amazonaws.com");
        assert_eq!(client.object_path("a.jpg"), "/a.jpg");
        assert_eq!(
            client.url_for(&client.object_path("a.jpg"), ""),
            "https://puploader.s3.us-east-2.amazonaws.com/a.jpg"
        );
        assert_eq!(
            client.default_public_base_url(),
            "https://puploader.s3.us-east-2.amazonaws.com/"
        );
    }

    #[test]
    fn test_path_style_addressing() {
        let client = Client::new(&config(Some("http://localhost:9000/")));
        assert_eq!(client.host(), "localhost:9000");
        assert_eq!(client.bucket_path(), "/puploader");
        assert_eq!(
            client.url_for(&client.object_path("a b.jpg"), ""),
            "http://localhost:9000/puploader/a%20b.jpg"
        );
        assert_eq!(
            client.default_public_base_url(),
            "http://localhost:9000/puploader/"
        );
    }

    #[test]
    fn test_signed_headers_present() {
        let client = Client::new(&config(None));
        let signer = Signer::new("DELETE", "/a.jpg", crate::storage::s3::signer::EMPTY_PAYLOAD_SHA256);
        let headers = client
            .signed_headers(signer, crate::storage::s3::signer::EMPTY_PAYLOAD_SHA256, &[])
            .unwrap();
        assert!(headers.contains_key("x-amz-date"));
        assert!(headers.contains_key("x-amz-content-sha256"));
        let auth = headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(auth.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));
    }

    #[test]
    fn test_bad_header_is_storage_error() {
        let client = Client::new(&config(None));
        let signer = Signer::new("PUT", "/a.jpg", "UNSIGNED-PAYLOAD");
        let err = client.signed_headers(
            signer,
            "UNSIGNED-PAYLOAD",
            &[("content-type", "image\njpeg".to_string())],
        );
        assert!(matches!(err, Err(AppError::Storage(_))));
    }
}
