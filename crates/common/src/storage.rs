//! File storage abstraction for uploaded images.

use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::io::AsyncWriteExt;

use crate::{AppError, AppResult, IdGenerator};

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key (path relative to the storage root).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a file under `key` unless that key is already taken.
    ///
    /// Returns `None` without touching the existing file when `key` exists.
    async fn create_new(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<Option<UploadedFile>>;

    /// Delete a file.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn create_new(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<Option<UploadedFile>> {
        let path = self.base_path.join(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => return Err(AppError::Storage(format!("Failed to create file: {e}"))),
        };

        let written = match file.write_all(data).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(AppError::Storage(format!("Failed to write file: {e}")));
        }

        Ok(Some(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        }))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        tokio::fs::try_exists(self.base_path.join(key))
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat file: {e}")))
    }
}

/// Reduce an uploaded file name to a safe single path segment.
///
/// Directory components are dropped, spaces become underscores and any
/// character outside `[A-Za-z0-9._-]` is removed.
#[must_use]
pub fn clean_file_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name)
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Store `data` under `dir` with a name derived from `original_name`.
///
/// The first choice is `dir/<clean name>`; while a name is taken a random
/// suffix is inserted before the extension. Each attempt is an exclusive
/// create, so concurrent uploads of the same name never share a key.
pub async fn save_unique(
    storage: &dyn StorageBackend,
    dir: &str,
    original_name: &str,
    data: &[u8],
    content_type: &str,
    id_gen: &IdGenerator,
) -> AppResult<UploadedFile> {
    let name = clean_file_name(original_name);
    let dir = dir.trim_end_matches('/');
    let (stem, extension) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], Some(&name[pos + 1..])),
        _ => (name.as_str(), None),
    };

    let mut key = format!("{dir}/{name}");
    loop {
        if let Some(stored) = storage.create_new(&key, data, content_type).await? {
            return Ok(stored);
        }

        let suffix = id_gen.generate_suffix();
        key = match extension {
            Some(ext) => format!("{dir}/{stem}_{suffix}.{ext}"),
            None => format!("{dir}/{stem}_{suffix}"),
        };
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_file_name() {
        assert_eq!(clean_file_name("small.gif"), "small.gif");
        assert_eq!(clean_file_name("../../etc/passwd"), "passwd");
        assert_eq!(clean_file_name("C:\\photos\\my cat.png"), "my_cat.png");
        assert_eq!(clean_file_name("фото.jpg"), "jpg");
        assert_eq!(clean_file_name(""), "upload");
    }

    #[tokio::test]
    async fn test_local_storage_create_new_and_exists() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "/media/".to_string());

        let uploaded = storage
            .create_new("posts/small.gif", b"GIF89a", "image/gif")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(uploaded.key, "posts/small.gif");
        assert_eq!(uploaded.url, "/media/posts/small.gif");
        assert_eq!(uploaded.size, 6);
        assert!(storage.exists("posts/small.gif").await.unwrap());

        storage.delete("posts/small.gif").await.unwrap();
        assert!(!storage.exists("posts/small.gif").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_new_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "/media".to_string());

        storage
            .create_new("posts/small.gif", b"first", "image/gif")
            .await
            .unwrap()
            .unwrap();
        let second = storage
            .create_new("posts/small.gif", b"second", "image/gif")
            .await
            .unwrap();

        assert!(second.is_none());
        let bytes = std::fs::read(dir.path().join("posts/small.gif")).unwrap();
        assert_eq!(bytes, b"first");
    }

    #[tokio::test]
    async fn test_save_unique_avoids_collision() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "/media".to_string());
        let id_gen = IdGenerator::new();

        let first = save_unique(&storage, "posts/", "small.gif", b"one", "image/gif", &id_gen)
            .await
            .unwrap();
        assert_eq!(first.key, "posts/small.gif");

        let second = save_unique(&storage, "posts", "small.gif", b"two", "image/gif", &id_gen)
            .await
            .unwrap();
        assert_ne!(second.key, first.key);
        assert!(second.key.starts_with("posts/small_"));
        assert!(second.key.ends_with(".gif"));
        assert_eq!(std::fs::read(dir.path().join(&first.key)).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join(&second.key)).unwrap(), b"two");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_save_unique_concurrent_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = std::sync::Arc::new(LocalStorage::new(
            dir.path().to_path_buf(),
            "/media".to_string(),
        ));

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                save_unique(storage.as_ref(), "posts", "small.gif", &[i], "image/gif", &IdGenerator::new())
                    .await
                    .unwrap()
            }));
        }

        let mut keys = std::collections::HashSet::new();
        for (i, handle) in handles.into_iter().enumerate() {
            let stored = handle.await.unwrap();
            assert_eq!(std::fs::read(dir.path().join(&stored.key)).unwrap(), [i as u8]);
            keys.insert(stored.key);
        }
        assert_eq!(keys.len(), 8);
    }
}
