use crate::error::Result;
use crate::models::{Scope, StoredEntry};
use crate::storage::StorageProvider;

/// Keeps a scope at or below a file count by deleting the oldest files
pub struct RetentionService;

impl RetentionService {
    /// Names to delete so that at most `max_count` files remain
    ///
    /// Directories are never candidates. Oldest first, ties broken by name.
    pub fn select_evictions(entries: &[StoredEntry], max_count: usize) -> Vec<String> {
        let mut files: Vec<&StoredEntry> = entries.iter().filter(|e| !e.is_dir).collect();
        if files.len() <= max_count {
            return Vec::new();
        }

        files.sort_by(|a, b| (a.modified, &a.name).cmp(&(b.modified, &b.name)));
        let excess = files.len() - max_count;
        files
            .into_iter()
            .take(excess)
            .map(|e| e.name.clone())
            .collect()
    }

    /// Delete the oldest files of `scope` until at most `max_count` remain
    pub async fn evict(
        provider: &dyn StorageProvider,
        scope: &Scope,
        max_count: usize,
    ) -> Result<Vec<String>> {
        let entries = provider.list(scope).await?;
        let victims = Self::select_evictions(&entries, max_count);

        for name in &victims {
            provider.delete(scope, name).await?;
            tracing::info!("Evicted {} from {}", name, scope);
        }

        Ok(victims)
    }
}
