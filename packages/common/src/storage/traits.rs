use async_trait::async_trait;

use super::error::StorageError;

/// Read-only access to the remote store photographers upload into.
///
/// A "folder" is an opaque reference recorded on a shooting-request product
/// (an S3 prefix in production, a plain directory in tests and dev).
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// List the file names directly inside a folder.
    async fn list_folder(&self, folder: &str) -> Result<Vec<String>, StorageError>;

    /// Download one file from a folder.
    async fn download(&self, folder: &str, name: &str) -> Result<Vec<u8>, StorageError>;
}
