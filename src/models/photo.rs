use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Folder sentinel meaning "upload to the root scope"
pub const DEFAULT_FOLDER: &str = "default";

/// Namespace a photo lives in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Root,
    Folder(String),
}

impl Scope {
    pub fn folder_name(&self) -> Option<&str> {
        match self {
            Scope::Root => None,
            Scope::Folder(name) => Some(name),
        }
    }

    /// Key used for per-scope locking
    pub fn key(&self) -> &str {
        self.folder_name().unwrap_or("")
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Root => write!(f, "<root>"),
            Scope::Folder(name) => write!(f, "{}", name),
        }
    }
}

/// One entry returned by a storage backend listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub name: String,
    pub modified: Option<DateTime<Utc>>,
    pub is_dir: bool,
}

impl StoredEntry {
    pub fn file(name: impl Into<String>, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            modified,
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modified: None,
            is_dir: true,
        }
    }
}

/// A single file taken from an upload request
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}

/// What happened to one uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    Stored { original: String, stored_as: String },
    Skipped { original: String, reason: String },
}

impl FileOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, FileOutcome::Stored { .. })
    }
}

/// Result of an upload batch
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub stored: usize,
    pub evicted: Vec<String>,
    pub files: Vec<FileOutcome>,
}

/// Folder and photo listing for one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryListing {
    pub folders: Vec<String>,
    pub photos: Vec<String>,
}

/// Gallery payload with resolved photo URLs
#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub folders: Vec<String>,
    pub photos: Vec<PhotoView>,
}

#[derive(Debug, Serialize)]
pub struct PhotoView {
    pub id: String,
    pub url: String,
}

/// Create folder request
#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct FolderResponse {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct FolderListResponse {
    pub folders: Vec<String>,
}

/// Query for a browser-direct bucket upload
#[derive(Debug, Deserialize)]
pub struct SignUploadQuery {
    pub file_name: String,
    pub file_type: String,
}

/// Presigned POST form for a browser-direct bucket upload
#[derive(Debug, Clone, Serialize)]
pub struct PresignedUpload {
    /// Form target
    pub upload_url: String,
    pub fields: BTreeMap<String, String>,
    /// Where the object is readable once uploaded
    pub url: String,
}
