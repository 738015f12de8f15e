use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::traits::PhotoStore;

/// S3-backed photo store. A folder reference maps to a key prefix inside a
/// single bucket.
pub struct S3PhotoStore {
    bucket: Box<Bucket>,
}

impl S3PhotoStore {
    /// Connect to a bucket. `endpoint` overrides the region endpoint for
    /// S3-compatible backends (MinIO and friends).
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: Option<&str>,
        access_key: Option<&str>,
        secret_key: Option<&str>,
    ) -> Result<Self, StorageError> {
        let region = match endpoint {
            Some(endpoint) => Region::Custom {
                region: region.to_string(),
                endpoint: endpoint.to_string(),
            },
            None => region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(access_key, secret_key, None, None, None)
            .map_err(|e| StorageError::Backend(format!("credentials: {e}")))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .with_path_style();

        Ok(Self { bucket })
    }

    fn prefix(folder: &str) -> String {
        let trimmed = folder.trim_matches('/');
        format!("{trimmed}/")
    }
}

#[async_trait]
impl PhotoStore for S3PhotoStore {
    async fn list_folder(&self, folder: &str) -> Result<Vec<String>, StorageError> {
        let prefix = Self::prefix(folder);
        let pages = self
            .bucket
            .list(prefix.clone(), Some("/".to_string()))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let mut names: Vec<String> = pages
            .iter()
            .flat_map(|page| page.contents.iter())
            .filter_map(|object| object.key.strip_prefix(&prefix))
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
            .collect();

        if names.is_empty() {
            return Err(StorageError::NotFound(folder.to_string()));
        }
        names.sort();
        Ok(names)
    }

    async fn download(&self, folder: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        let key = format!("{}{name}", Self::prefix(folder));
        let response = self
            .bucket
            .get_object(&key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match response.status_code() {
            200 => Ok(response.to_vec()),
            404 => Err(StorageError::NotFound(key)),
            code => Err(StorageError::Backend(format!(
                "unexpected status {code} fetching {key}"
            ))),
        }
    }
}
