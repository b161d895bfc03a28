//! Browser-based uploads with a signed POST policy.
//! Reference: https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-HTTPPOSTConstructPolicy.html

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::collections::BTreeMap;

use crate::storage::s3::client::Client;
use crate::storage::s3::signer::{credential_scope, derive_signing_key, hmac_sha256, ALGORITHM};

/// Canned ACL applied to browser uploads
pub const UPLOAD_ACL: &str = "public-read";

/// Fixed lifetime of a presigned POST
pub const POST_POLICY_EXPIRY_SECS: i64 = 3600;

impl Client {
    /// Form fields for a direct browser upload of `key`
    pub fn post_policy_fields(
        &self,
        key: &str,
        content_type: &str,
        now: DateTime<Utc>,
    ) -> BTreeMap<String, String> {
        let date_time = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let credential = format!(
            "{}/{}",
            self.access_key_id(),
            credential_scope(&date, self.region())
        );
        let expiration = (now + Duration::seconds(POST_POLICY_EXPIRY_SECS))
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let policy = serde_json::json!({
            "expiration": expiration,
            "conditions": [
                { "bucket": self.bucket() },
                { "key": key },
                { "acl": UPLOAD_ACL },
                { "Content-Type": content_type },
                { "x-amz-algorithm": ALGORITHM },
                { "x-amz-credential": credential },
                { "x-amz-date": date_time },
            ]
        });
        let encoded_policy = STANDARD.encode(policy.to_string());

        let signing_key = derive_signing_key(self.secret_access_key(), &date, self.region(), "s3");
        let signature = hex::encode(hmac_sha256(&signing_key, encoded_policy.as_bytes()));

        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), key.to_string());
        fields.insert("acl".to_string(), UPLOAD_ACL.to_string());
        fields.insert("Content-Type".to_string(), content_type.to_string());
        fields.insert("x-amz-algorithm".to_string(), ALGORITHM.to_string());
        fields.insert("x-amz-credential".to_string(), credential);
        fields.insert("x-amz-date".to_string(), date_time);
        fields.insert("policy".to_string(), encoded_policy);
        fields.insert("x-amz-signature".to_string(), signature);
        fields
    }
}
