use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::PhotoStore;

/// Filesystem-backed photo store rooted at a base directory.
///
/// Used in tests and single-machine deployments where photographers drop
/// files onto a shared mount.
pub struct FilesystemPhotoStore {
    base_path: PathBuf,
}

impl FilesystemPhotoStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Resolve a folder reference, rejecting path traversal.
    fn folder_path(&self, folder: &str) -> Result<PathBuf, StorageError> {
        if folder.split('/').any(|part| part == "..") || Path::new(folder).is_absolute() {
            return Err(StorageError::Backend(format!(
                "invalid folder reference: {folder}"
            )));
        }
        Ok(self.base_path.join(folder))
    }
}

#[async_trait]
impl PhotoStore for FilesystemPhotoStore {
    async fn list_folder(&self, folder: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.folder_path(folder)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(folder.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn download(&self, folder: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        if name.contains('/') || name.contains("..") {
            return Err(StorageError::Backend(format!("invalid file name: {name}")));
        }
        let path = self.folder_path(folder)?.join(name);
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("{folder}/{name}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_folder(files: &[(&str, &[u8])]) -> (FilesystemPhotoStore, tempfile::TempDir)
    {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("req-1/4601234567890");
        std::fs::create_dir_all(&folder).unwrap();
        for (name, data) in files {
            std::fs::write(folder.join(name), data).unwrap();
        }
        (FilesystemPhotoStore::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn list_returns_sorted_file_names() {
        let (store, _dir) =
            store_with_folder(&[("b.jpg", b"2"), ("a.jpg", b"1"), ("c.cr2", b"3")]).await;
        let names = store.list_folder("req-1/4601234567890").await.unwrap();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.cr2"]);
    }

    #[tokio::test]
    async fn list_skips_subdirectories() {
        let (store, dir) = store_with_folder(&[("a.jpg", b"1")]).await;
        std::fs::create_dir(dir.path().join("req-1/4601234567890/raw")).unwrap();
        let names = store.list_folder("req-1/4601234567890").await.unwrap();
        assert_eq!(names, vec!["a.jpg"]);
    }

    #[tokio::test]
    async fn download_round_trip() {
        let (store, _dir) = store_with_folder(&[("a.jpg", b"payload")]).await;
        let data = store.download("req-1/4601234567890", "a.jpg").await.unwrap();
        assert_eq!(data, b"payload");
    }

    #[tokio::test]
    async fn missing_folder_is_not_found() {
        let (store, _dir) = store_with_folder(&[]).await;
        assert!(matches!(
            store.list_folder("req-9/none").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let (store, _dir) = store_with_folder(&[]).await;
        assert!(store.list_folder("../outside").await.is_err());
        assert!(
            store
                .download("req-1/4601234567890", "../a.jpg")
                .await
                .is_err()
        );
    }
}
