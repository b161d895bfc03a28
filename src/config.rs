use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default = "default_jwt_secret")]
    pub secret: String,
    #[serde(default = "default_access_token_expire")]
    pub access_token_expire_minutes: u64,
}

/// Which backend photos are written to. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    #[default]
    Local,
    Bucket,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Local => "local",
            StorageMode::Bucket => "bucket",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" => Some(StorageMode::Local),
            "bucket" | "s3" => Some(StorageMode::Bucket),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub mode: StorageMode,
    #[serde(default = "default_local_path")]
    pub local_path: String,
    /// Retention cap per scope in local mode, 0 disables eviction
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Private deployments may create folders
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub bucket: BucketConfig,
}

/// S3-compatible bucket configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BucketConfig {
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services, switches to path-style addressing
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    /// Base URL photos are served from, defaults to the virtual-hosted bucket URL
    #[serde(default)]
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourcesConfig {
    #[serde(default = "default_no_photo_url")]
    pub no_photo_url: String,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_db_path() -> String {
    "data/puploader.db".to_string()
}

fn default_jwt_secret() -> String {
    "change-this-puploader-secret".to_string()
}

fn default_access_token_expire() -> u64 {
    60 * 24 // one day
}

fn default_local_path() -> String {
    "data/uploads".to_string()
}

fn default_max_items() -> usize {
    500
}

fn default_region() -> String {
    "us-east-2".to_string()
}

fn default_no_photo_url() -> String {
    "/assets/no_photo_avail.jpg".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            access_token_expire_minutes: default_access_token_expire(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            local_path: default_local_path(),
            max_items: default_max_items(),
            private: false,
            bucket: BucketConfig::default(),
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            no_photo_url: default_no_photo_url(),
        }
    }
}

impl StorageConfig {
    /// Retention cap, `None` when eviction is disabled
    pub fn retention_cap(&self) -> Option<usize> {
        (self.max_items > 0).then_some(self.max_items)
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides();
        config.validate()?;
        config.ensure_directories()?;
        config.ensure_jwt_secret()?;
        tracing::info!(
            "Storage config: mode={}, local_path={}, max_items={}, private={}",
            config.storage.mode.as_str(),
            config.storage.local_path,
            config.storage.max_items,
            config.storage.private
        );
        Ok(config)
    }

    /// Ensure JWT secret is secure and persisted
    fn ensure_jwt_secret(&mut self) -> anyhow::Result<()> {
        if self.jwt.secret == default_jwt_secret() || self.jwt.secret.is_empty() {
            let secret_path = Path::new("data/.jwt_secret");

            if secret_path.exists() {
                let secret = fs::read_to_string(secret_path)?;
                self.jwt.secret = secret.trim().to_string();
                tracing::info!("Loaded persisted JWT secret from data/.jwt_secret");
            } else {
                let secret = uuid::Uuid::new_v4().to_string();

                if let Some(parent) = secret_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                fs::write(secret_path, &secret)?;
                self.jwt.secret = secret;
                tracing::info!("Generated and persisted new JWT secret to data/.jwt_secret");
            }
        }
        Ok(())
    }

    /// Load configuration from puploader.toml or config.toml
    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = [
            "puploader.toml",
            "config.toml",
            "data/puploader.toml",
            "data/config.toml",
        ];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config: Config = toml::from_str(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment variable overrides
    /// Format: PUP_CONF_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(val) = env::var("PUP_CONF_SERVER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("PUP_CONF_SERVER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = env::var("PUP_CONF_SERVER_MAX_UPLOAD_BYTES") {
            if let Ok(bytes) = val.parse() {
                self.server.max_upload_bytes = bytes;
            }
        }

        // Database overrides
        if let Ok(val) = env::var("PUP_CONF_DATABASE_PATH") {
            self.database.path = val;
        }

        // JWT overrides
        if let Ok(val) = env::var("PUP_CONF_JWT_SECRET") {
            self.jwt.secret = val;
        }
        if let Ok(val) = env::var("PUP_CONF_JWT_ACCESS_EXPIRE") {
            if let Ok(minutes) = val.parse() {
                self.jwt.access_token_expire_minutes = minutes;
            }
        }

        // Storage overrides
        if let Ok(val) = env::var("PUP_CONF_STORAGE_MODE") {
            match StorageMode::from_str(&val) {
                Some(mode) => self.storage.mode = mode,
                None => tracing::warn!("Ignoring unknown storage mode {:?}", val),
            }
        }
        if let Ok(val) = env::var("PUP_CONF_STORAGE_LOCAL_PATH") {
            self.storage.local_path = val;
        }
        if let Ok(val) = env::var("PUP_CONF_STORAGE_MAX_ITEMS") {
            if let Ok(max) = val.parse() {
                self.storage.max_items = max;
            }
        }
        if let Ok(val) = env::var("PUP_CONF_STORAGE_PRIVATE") {
            if let Ok(v) = val.parse() {
                self.storage.private = v;
            }
        }

        // Bucket overrides
        if let Ok(val) = env::var("PUP_CONF_BUCKET_NAME") {
            self.storage.bucket.bucket = val;
        }
        if let Ok(val) = env::var("PUP_CONF_BUCKET_REGION") {
            if !val.trim().is_empty() {
                self.storage.bucket.region = val;
            }
        }
        if let Ok(val) = env::var("PUP_CONF_BUCKET_ENDPOINT") {
            if !val.trim().is_empty() {
                self.storage.bucket.endpoint = Some(val);
            }
        }
        if let Ok(val) = env::var("PUP_CONF_BUCKET_ACCESS_KEY_ID") {
            self.storage.bucket.access_key_id = val;
        }
        if let Ok(val) = env::var("PUP_CONF_BUCKET_SECRET_ACCESS_KEY") {
            self.storage.bucket.secret_access_key = val;
        }
        if let Ok(val) = env::var("PUP_CONF_BUCKET_PUBLIC_BASE_URL") {
            if !val.trim().is_empty() {
                self.storage.bucket.public_base_url = Some(val);
            }
        }

        // Resources overrides
        if let Ok(val) = env::var("PUP_CONF_RESOURCES_NO_PHOTO_URL") {
            self.resources.no_photo_url = val;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.storage.mode == StorageMode::Bucket && self.storage.bucket.bucket.trim().is_empty() {
            anyhow::bail!("storage.mode = \"bucket\" requires storage.bucket.bucket to be set");
        }
        Ok(())
    }

    /// Ensure required directories exist
    fn ensure_directories(&self) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(&self.database.path).parent() {
            fs::create_dir_all(parent)?;
        }

        if self.storage.mode == StorageMode::Local {
            fs::create_dir_all(&self.storage.local_path)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.mode, StorageMode::Local);
        assert_eq!(config.storage.local_path, "data/uploads");
        assert!(!config.storage.private);
        assert_eq!(config.storage.retention_cap(), Some(500));
    }

    #[test]
    fn test_bucket_section() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            mode = "bucket"
            max_items = 0

            [storage.bucket]
            bucket = "puploader"
            region = "us-east-2"
            access_key_id = "AKID"
            secret_access_key = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.mode, StorageMode::Bucket);
        assert_eq!(config.storage.bucket.bucket, "puploader");
        assert!(config.storage.bucket.endpoint.is_none());
        assert_eq!(config.storage.retention_cap(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bucket_mode_requires_bucket_name() {
        let mut config = Config::default();
        config.storage.mode = StorageMode::Bucket;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_mode_from_str() {
        assert_eq!(StorageMode::from_str("LOCAL"), Some(StorageMode::Local));
        assert_eq!(StorageMode::from_str("s3"), Some(StorageMode::Bucket));
        assert_eq!(StorageMode::from_str("ftp"), None);
    }
}
