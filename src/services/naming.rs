//! File and folder name rules for uploads

use std::collections::BTreeSet;

use crate::error::{AppError, Result};

/// Extensions accepted for upload, compared lowercased
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["gif", "jpg", "jpeg", "png"];

const DUPE_SUFFIX: &str = "_dupe";

/// Split at the last `.` into stem and extension (extension keeps its dot)
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos..]),
        None => (name, ""),
    }
}

/// Whether the file's extension is one of the allowed image types
pub fn is_allowed_extension(name: &str) -> bool {
    match name.rfind('.') {
        Some(pos) => {
            let ext = name[pos + 1..].to_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Collision-free name for `candidate` within `existing`
///
/// Each collision inserts another `_dupe` before the extension.
pub fn resolve_unique_name(candidate: &str, existing: &BTreeSet<String>) -> String {
    let (stem, ext) = split_extension(candidate);
    let mut stem = stem.to_string();
    let mut name = candidate.to_string();

    while existing.contains(&name) {
        stem.push_str(DUPE_SUFFIX);
        name = format!("{}{}", stem, ext);
    }

    name
}

/// Reduce an uploaded file name to something safe to store
///
/// Keeps the last path component, maps whitespace to `_` and drops anything
/// outside ASCII alphanumerics and `._-`. Returns `None` if nothing is left.
pub fn secure_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Folder name as used on disk: lowercased with `.`, `/` and `\` removed
pub fn sanitize_folder_name(raw: &str) -> Result<String> {
    let name: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | '/' | '\\'))
        .collect();

    if name.is_empty() {
        return Err(AppError::InvalidScopeName(raw.to_string()));
    }
    Ok(name)
}
