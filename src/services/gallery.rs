use crate::error::{AppError, Result};
use crate::models::{GalleryListing, GalleryResponse, PhotoView, Scope};
use crate::storage::StorageProvider;

/// Route local photos are served under
pub const LOCAL_PHOTO_ROUTE: &str = "/uploads";

/// Gallery listing service
pub struct GalleryService;

impl GalleryService {
    /// Folders and photos of the root or of one folder
    ///
    /// A scope path containing `.` (or a path separator) is rejected before
    /// anything is listed.
    pub async fn list_gallery(
        provider: &dyn StorageProvider,
        scope_path: Option<&str>,
    ) -> Result<GalleryListing> {
        let scope = match scope_path {
            None => Scope::Root,
            Some(path) if path.contains(['.', '/', '\\']) || path.is_empty() => {
                return Err(AppError::InvalidScopeName(path.to_string()));
            }
            Some(path) => Scope::Folder(path.to_string()),
        };

        let entries = provider.list(&scope).await?;
        tracing::debug!("Listed {} entries in {}", entries.len(), scope);

        let mut folders = Vec::new();
        let mut photos = Vec::new();
        for entry in entries {
            if entry.is_dir {
                folders.push(entry.name);
                continue;
            }
            if !entry.name.contains('.') {
                continue;
            }
            let photo = match provider.photo_url(&scope, &entry.name) {
                Some(url) => url,
                None => match scope_path {
                    Some(path) => format!("{}/{}", path, entry.name),
                    None => entry.name,
                },
            };
            photos.push(photo);
        }
        folders.sort();

        Ok(GalleryListing { folders, photos })
    }

    /// Root photos for the public landing feed
    pub async fn feed(provider: &dyn StorageProvider) -> Result<Vec<PhotoView>> {
        let listing = Self::list_gallery(provider, None).await?;
        Ok(listing.photos.into_iter().map(Self::photo_view).collect())
    }

    /// Attach a fetchable URL to every photo of a listing
    pub fn present(listing: GalleryListing) -> GalleryResponse {
        GalleryResponse {
            folders: listing.folders,
            photos: listing.photos.into_iter().map(Self::photo_view).collect(),
        }
    }

    fn photo_view(photo: String) -> PhotoView {
        if photo.starts_with("http://") || photo.starts_with("https://") {
            let id = photo.rsplit('/').next().unwrap_or(&photo).to_string();
            PhotoView { id, url: photo }
        } else {
            let url = format!("{}/{}", LOCAL_PHOTO_ROUTE, photo);
            PhotoView { id: photo, url }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryBucket;
    use crate::storage::LocalStorage;

    fn seeded() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("zeta")).unwrap();
        std::fs::create_dir(dir.path().join("alpha")).unwrap();
        std::fs::write(dir.path().join("rex.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("README"), b"x").unwrap();
        std::fs::write(dir.path().join("alpha").join("fido.png"), b"x").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_root_listing() {
        let dir = seeded();
        let storage = LocalStorage::new(dir.path());

        let listing = GalleryService::list_gallery(&storage, None).await.unwrap();
        assert_eq!(listing.folders, vec!["alpha", "zeta"]);
        assert_eq!(listing.photos, vec!["rex.jpg"]);
    }

    #[tokio::test]
    async fn test_subfolder_photos_are_prefixed() {
        let dir = seeded();
        let storage = LocalStorage::new(dir.path());

        let listing = GalleryService::list_gallery(&storage, Some("alpha")).await.unwrap();
        assert!(listing.folders.is_empty());
        assert_eq!(listing.photos, vec!["alpha/fido.png"]);
    }

    #[tokio::test]
    async fn test_dotted_scope_is_rejected() {
        let dir = seeded();
        let storage = LocalStorage::new(dir.path());

        for path in ["..", "a.b", "../alpha"] {
            let err = GalleryService::list_gallery(&storage, Some(path)).await;
            assert!(matches!(err, Err(AppError::InvalidScopeName(_))), "{}", path);
        }
        let err = GalleryService::list_gallery(&storage, Some("missing")).await;
        assert!(matches!(err, Err(AppError::InvalidScopeName(_))));
    }

    #[tokio::test]
    async fn test_bucket_photos_are_urls() {
        let bucket = MemoryBucket::with_objects(&["rex.jpg", "fido.png"]);

        let listing = GalleryService::list_gallery(&bucket, None).await.unwrap();
        assert!(listing.folders.is_empty());
        assert_eq!(
            listing.photos,
            vec![
                "https://pups.s3.us-east-2.amazonaws.com/fido.png",
                "https://pups.s3.us-east-2.amazonaws.com/rex.jpg",
            ]
        );

        let err = GalleryService::list_gallery(&bucket, Some("pups")).await;
        assert!(matches!(err, Err(AppError::InvalidScopeName(_))));
    }

    #[tokio::test]
    async fn test_present_and_feed() {
        let dir = seeded();
        let storage = LocalStorage::new(dir.path());

        let listing = GalleryService::list_gallery(&storage, Some("alpha")).await.unwrap();
        let response = GalleryService::present(listing);
        assert_eq!(response.photos[0].id, "alpha/fido.png");
        assert_eq!(response.photos[0].url, "/uploads/alpha/fido.png");

        let bucket = MemoryBucket::with_objects(&["rex.jpg"]);
        let feed = GalleryService::feed(&bucket).await.unwrap();
        assert_eq!(feed[0].id, "rex.jpg");
        assert_eq!(feed[0].url, "https://pups.s3.us-east-2.amazonaws.com/rex.jpg");
    }
}
