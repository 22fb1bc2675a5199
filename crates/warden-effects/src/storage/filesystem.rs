use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;
use warden_core::effects::{StorageEffects, StorageError};

/// Filesystem-based storage handler
///
/// Stores each value as `<base>/<key>.dat`. Keys may contain `/`, which maps
/// to nested directories, so `secret_id/app/web/ab12` lands in
/// `<base>/secret_id/app/web/ab12.dat`.
#[derive(Debug, Clone)]
pub struct FilesystemStorageHandler {
    base_path: PathBuf,
}

impl FilesystemStorageHandler {
    /// Create a new filesystem storage handler rooted at `base_path`
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                reason: "Key cannot be empty".to_string(),
            });
        }
        if key.starts_with('/')
            || key
                .split('/')
                .any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(StorageError::InvalidKey {
                reason: format!("Key has an empty or relative path component: {key}"),
            });
        }
        Ok(self.base_path.join(format!("{key}.{RECORD_EXT}")))
    }

    /// Deepest directory that can hold keys starting with `prefix`
    fn scan_root(&self, prefix: Option<&str>) -> PathBuf {
        match prefix.and_then(|p| p.rsplit_once('/')) {
            Some((dir, _)) if !dir.is_empty() && !dir.split('/').any(|p| p == "..") => {
                self.base_path.join(dir)
            }
            _ => self.base_path.clone(),
        }
    }

    fn key_of(&self, path: &Path) -> Option<String> {
        if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
            return None;
        }
        let rel = path.strip_prefix(&self.base_path).ok()?;
        let key = rel.with_extension("").to_string_lossy().into_owned();
        Some(key.replace(std::path::MAIN_SEPARATOR, "/"))
    }
}

const RECORD_EXT: &str = "dat";
const PARTIAL_EXT: &str = "partial";

#[async_trait]
impl StorageEffects for FilesystemStorageHandler {
    /// Each write goes to its own sibling `<key>.<uuid>.partial` file that is
    /// renamed into place, so a reader never observes a half-written record
    /// and concurrent writers of one key end with the last rename winning.
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let file_path = self.file_path(key)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::WriteFailed(format!("Failed to create directory for {key}: {e}"))
            })?;
        }

        let partial = file_path.with_extension(format!("{}.{PARTIAL_EXT}", Uuid::new_v4()));
        if let Err(e) = fs::write(&partial, value).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::WriteFailed(format!("Failed to write {key}: {e}")));
        }
        if let Err(e) = fs::rename(&partial, &file_path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::WriteFailed(format!("Failed to commit {key}: {e}")));
        }
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.file_path(key)?).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!("Failed to read {key}: {e}"))),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        match fs::remove_file(self.file_path(key)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to remove {key}: {e}"
            ))),
        }
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        let read_failed = |e: std::io::Error| {
            StorageError::ReadFailed(format!("Failed to list directory: {e}"))
        };

        let mut keys = Vec::new();
        let mut pending = vec![self.scan_root(prefix)];
        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(read_failed(e)),
            };
            while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
                let path = entry.path();
                if entry.file_type().await.map_err(read_failed)?.is_dir() {
                    pending.push(path);
                } else if let Some(key) = self.key_of(&path) {
                    if prefix.map_or(true, |p| key.starts_with(p)) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_retrieve_remove_nested_key() {
        let temp_dir = TempDir::new().unwrap();
        let handler = FilesystemStorageHandler::new(temp_dir.path().to_path_buf());

        let key = "secret_id/app/web/ab12";
        handler.store(key, b"record".to_vec()).await.unwrap();
        assert_eq!(
            handler.retrieve(key).await.unwrap(),
            Some(b"record".to_vec())
        );

        assert!(handler.remove(key).await.unwrap());
        assert!(!handler.remove(key).await.unwrap());
        assert_eq!(handler.retrieve(key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_keys_with_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let handler = FilesystemStorageHandler::new(temp_dir.path().to_path_buf());

        handler.store("app/web", vec![1]).await.unwrap();
        handler.store("app/api", vec![2]).await.unwrap();
        handler.store("group/ops", vec![3]).await.unwrap();

        assert_eq!(
            handler.list_keys(Some("app/")).await.unwrap(),
            vec!["app/api".to_string(), "app/web".to_string()]
        );
        assert_eq!(handler.list_keys(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_store_replaces_without_leftovers() {
        let temp_dir = TempDir::new().unwrap();
        let handler = FilesystemStorageHandler::new(temp_dir.path().to_path_buf());

        handler.store("group/ops", vec![1]).await.unwrap();
        handler.store("group/ops", vec![2]).await.unwrap();
        assert_eq!(handler.retrieve("group/ops").await.unwrap(), Some(vec![2]));

        let mut names = Vec::new();
        let mut dir = std::fs::read_dir(temp_dir.path().join("group")).unwrap();
        while let Some(Ok(entry)) = dir.next() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["ops.dat"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_stores_of_one_key() {
        let temp_dir = TempDir::new().unwrap();
        let handler = FilesystemStorageHandler::new(temp_dir.path().to_path_buf());

        for round in 0..20u8 {
            let writers: Vec<_> = (0..8u8)
                .map(|writer| {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        handler.store("app/web", vec![round * 8 + writer; 64]).await
                    })
                })
                .collect();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }

            let stored = handler.retrieve("app/web").await.unwrap().unwrap();
            assert_eq!(stored.len(), 64);
            assert!(stored.iter().all(|b| *b == stored[0]));
        }

        let mut names = Vec::new();
        let mut dir = std::fs::read_dir(temp_dir.path().join("app")).unwrap();
        while let Some(Ok(entry)) = dir.next() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["web.dat"]);
        assert_eq!(handler.list_keys(None).await.unwrap(), vec!["app/web".to_string()]);
    }

    #[tokio::test]
    async fn test_prefix_scan_stays_in_namespace() {
        let temp_dir = TempDir::new().unwrap();
        let handler = FilesystemStorageHandler::new(temp_dir.path().to_path_buf());

        handler.store("secret_id/app/web/aa", vec![1]).await.unwrap();
        handler.store("secret_id/app/web2/bb", vec![2]).await.unwrap();
        handler.store("secret_id/supergroup/cc", vec![3]).await.unwrap();

        assert_eq!(
            handler.list_keys(Some("secret_id/app/web/")).await.unwrap(),
            vec!["secret_id/app/web/aa".to_string()]
        );
        assert_eq!(
            handler.list_keys(Some("secret_id/app/web")).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_list_keys_on_missing_base_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let handler = FilesystemStorageHandler::new(temp_dir.path().join("never-created"));
        assert!(handler.list_keys(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let temp_dir = TempDir::new().unwrap();
        let handler = FilesystemStorageHandler::new(temp_dir.path().to_path_buf());

        for key in ["", "../escape", "app//web", "/abs", "app/./web"] {
            assert!(
                matches!(
                    handler.store(key, vec![0]).await,
                    Err(StorageError::InvalidKey { .. })
                ),
                "key {key:?} should be rejected"
            );
        }
    }
}
