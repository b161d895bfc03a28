pub mod local;
#[cfg(test)]
pub mod memory;
pub mod provider;
pub mod s3;

pub use local::*;
pub use provider::*;
pub use s3::S3Storage;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

use crate::config::{StorageConfig, StorageMode};
use crate::models::Scope;

/// Owns the storage provider picked at startup
///
/// Also serializes writers per scope so that name resolution, eviction and
/// the store itself are not interleaved between concurrent uploads.
pub struct StorageManager {
    provider: Arc<dyn StorageProvider>,
    scope_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl StorageManager {
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            provider,
            scope_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build the provider for the configured mode
    pub fn from_config(config: &StorageConfig) -> Self {
        let provider: Arc<dyn StorageProvider> = match config.mode {
            StorageMode::Local => Arc::new(LocalStorage::new(&config.local_path)),
            StorageMode::Bucket => Arc::new(S3Storage::new(&config.bucket)),
        };
        tracing::info!("Using {} storage", config.mode.as_str());
        Self::new(provider)
    }

    pub fn provider(&self) -> &dyn StorageProvider {
        self.provider.as_ref()
    }

    pub fn mode(&self) -> StorageMode {
        self.provider.mode()
    }

    /// Exclusive access to one scope for the lifetime of the guard
    pub async fn lock_scope(&self, scope: &Scope) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .scope_locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            // Only the map holds idle locks
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(scope.key().to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) fn tracked_scopes(&self) -> usize {
        self.scope_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(dir: &std::path::Path) -> StorageManager {
        StorageManager::new(Arc::new(LocalStorage::new(dir)))
    }

    #[tokio::test]
    async fn test_idle_scope_locks_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let storage = manager(dir.path());

        for i in 0..1000 {
            let _guard = storage.lock_scope(&Scope::Folder(format!("nope{}", i))).await;
        }
        assert!(storage.tracked_scopes() <= 1);
    }

    #[tokio::test]
    async fn test_held_scope_lock_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let storage = manager(dir.path());

        let held = storage.lock_scope(&Scope::Root).await;
        for i in 0..10 {
            let _guard = storage.lock_scope(&Scope::Folder(format!("f{}", i))).await;
        }
        assert_eq!(storage.tracked_scopes(), 2);

        let waiting = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            storage.lock_scope(&Scope::Root),
        )
        .await;
        assert!(waiting.is_err());

        drop(held);
        let _again = storage.lock_scope(&Scope::Root).await;
    }
}
