//! File-per-key blob storage

use crate::error::{CacheError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info, warn};

/// File extension used for every cached blob
const BLOB_EXTENSION: &str = "jpg";

/// Counter for unique staging file names within this process
static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A blob cache backed by a single directory, one file per key
#[derive(Debug, Clone)]
pub struct BlobCache {
    /// Directory where cached blobs are stored
    cache_dir: PathBuf,
}

impl BlobCache {
    /// Create a new blob cache rooted at `cache_dir`
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Ensure the cache directory exists, creating parents as needed.
    ///
    /// Returns `true` when the directory had to be created.
    pub async fn init(&self) -> Result<bool> {
        if fs::try_exists(&self.cache_dir).await? {
            debug!(cache_dir = ?self.cache_dir, "Cache directory already exists");
            return Ok(false);
        }

        fs::create_dir_all(&self.cache_dir).await?;
        info!(cache_dir = ?self.cache_dir, "Cache directory created");
        Ok(true)
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.cache_dir.join(format!("{}.{}", key, BLOB_EXTENSION)))
    }

    /// Read the blob stored under `key`.
    ///
    /// A zero-length file is returned as an empty vector; deciding what that
    /// means is up to the caller.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;

        match fs::read(&path).await {
            Ok(data) => {
                debug!(key, size = data.len(), "Read cached blob");
                Ok(data)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Store `data` under `key`, replacing any previous blob.
    ///
    /// The bytes are staged in a sibling temp file and renamed into place so
    /// readers see either the old or the new content.
    pub async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let staging = self.staging_path();

        if let Err(e) = fs::write(&staging, data).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&staging, &path).await {
            warn!(key, error = %e, "Failed to move staged blob into place");
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }

        debug!(key, size = data.len(), "Cached blob");
        Ok(())
    }

    /// Remove the blob stored under `key`
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "Removed cached blob");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Hidden temp file name of fixed length; the `.tmp` suffix never
    /// collides with a blob file
    fn staging_path(&self) -> PathBuf {
        let n = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.cache_dir.join(format!(".{}-{}.tmp", std::process::id(), n))
    }
}

/// Reject keys that do not name a single file directly under the root
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains(['/', '\0']) {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_path_for_uses_jpg_extension() {
        let cache = BlobCache::new("/var/cache/cats");
        let path = cache.path_for("404").unwrap();
        assert_eq!(path, PathBuf::from("/var/cache/cats/404.jpg"));
    }

    #[test]
    fn test_path_for_rejects_escaping_keys() {
        let cache = BlobCache::new("/var/cache/cats");

        for key in ["", "a/b", "../etc/passwd", "nul\0"] {
            assert!(
                matches!(cache.path_for(key), Err(CacheError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }

        // Not status codes, but still plain file names under the root
        assert!(cache.path_for("teapot").is_ok());
        assert!(cache.path_for("back\\slash").is_ok());
        assert_eq!(
            cache.path_for("..").unwrap(),
            PathBuf::from("/var/cache/cats/...jpg")
        );
    }

    #[tokio::test]
    async fn test_init_creates_nested_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("a").join("b");
        let cache = BlobCache::new(&root);

        assert!(cache.init().await.unwrap());
        assert!(root.is_dir());

        // Second call is a no-op
        assert!(!cache.init().await.unwrap());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = tempdir().unwrap();
        let cache = BlobCache::new(dir.path());
        cache.init().await.unwrap();

        cache.write("200", b"\xff\xd8\xffjpeg").await.unwrap();

        let data = cache.read("200").await.unwrap();
        assert_eq!(data, b"\xff\xd8\xffjpeg");
        assert!(dir.path().join("200.jpg").is_file());
    }

    #[tokio::test]
    async fn test_write_replaces_previous_content() {
        let dir = tempdir().unwrap();
        let cache = BlobCache::new(dir.path());
        cache.init().await.unwrap();

        cache.write("500", b"first version, longer").await.unwrap();
        cache.write("500", b"second").await.unwrap();

        assert_eq!(cache.read("500").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_write_leaves_no_staging_files() {
        let dir = tempdir().unwrap();
        let cache = BlobCache::new(dir.path());
        cache.init().await.unwrap();

        cache.write("201", b"data").await.unwrap();
        cache.write("202", b"").await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["201.jpg", "202.jpg"]);
    }

    #[tokio::test]
    async fn test_write_long_key() {
        let dir = tempdir().unwrap();
        let cache = BlobCache::new(dir.path());
        cache.init().await.unwrap();

        // 245 + ".jpg" stays under the usual 255-byte file name limit
        let key = "7".repeat(245);
        cache.write(&key, b"long").await.unwrap();
        assert_eq!(cache.read(&key).await.unwrap(), b"long");
    }

    #[tokio::test]
    async fn test_invalid_key_never_touches_disk() {
        let dir = tempdir().unwrap();
        let cache = BlobCache::new(dir.path());
        cache.init().await.unwrap();

        assert!(matches!(
            cache.write("a/b", b"x").await,
            Err(CacheError::InvalidKey(_))
        ));
        assert!(matches!(cache.read("a/b").await, Err(CacheError::InvalidKey(_))));
        assert!(matches!(cache.delete("a/b").await, Err(CacheError::InvalidKey(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_read_empty_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let cache = BlobCache::new(dir.path());
        cache.init().await.unwrap();

        cache.write("204", b"").await.unwrap();
        assert!(cache.read("204").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_missing() {
        let dir = tempdir().unwrap();
        let cache = BlobCache::new(dir.path());
        cache.init().await.unwrap();

        let result = cache.read("418").await;
        assert!(matches!(result, Err(CacheError::NotFound(k)) if k == "418"));
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempdir().unwrap();
        let cache = BlobCache::new(dir.path());
        cache.init().await.unwrap();

        cache.write("301", b"moved").await.unwrap();
        cache.delete("301").await.unwrap();

        assert!(matches!(cache.read("301").await, Err(CacheError::NotFound(_))));
        assert!(matches!(cache.delete("301").await, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let cache = BlobCache::new(dir.path().join("never-created"));

        let result = cache.write("200", b"data").await;
        assert!(matches!(result, Err(CacheError::Io(_))));
    }
}
