use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::config::LocalStorageConfig;
use crate::core::error::AppError;
use crate::modules::storage::BlobStore;

/// Blob store writing into a local directory served over HTTP
pub struct LocalBlobStore {
    upload_dir: PathBuf,
    url_prefix: String,
}

impl LocalBlobStore {
    /// Create the store, making sure the upload directory exists
    pub async fn new(config: &LocalStorageConfig) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to create upload directory '{}': {}",
                    config.upload_dir.display(),
                    e
                ))
            })?;

        info!(
            "Local blob store ready: dir={}, url_prefix={}",
            config.upload_dir.display(),
            config.url_prefix
        );

        Ok(Self {
            upload_dir: config.upload_dir.clone(),
            url_prefix: config.url_prefix.clone(),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Keys must be a single path component
    fn is_valid_key(key: &str) -> bool {
        !key.is_empty()
            && !key.starts_with('.')
            && Path::new(key).file_name().and_then(|n| n.to_str()) == Some(key)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        if !Self::is_valid_key(key) {
            return Err(AppError::Internal(format!("Invalid storage key '{}'", key)));
        }

        let path = self.upload_dir.join(key);
        tokio::fs::write(&path, &data).await.map_err(|e| {
            AppError::Storage(format!("Failed to write '{}': {}", path.display(), e))
        })?;

        debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(format!("{}/{}", self.url_prefix, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_in(dir: &Path) -> LocalBlobStore {
        LocalBlobStore::new(&LocalStorageConfig {
            upload_dir: dir.join("uploads"),
            url_prefix: "/uploads".to_string(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let url = store
            .save("0190_diagram.png", b"png-bytes".to_vec(), "image/png")
            .await
            .unwrap();

        assert_eq!(url, "/uploads/0190_diagram.png");
        let written = std::fs::read(store.upload_dir().join("0190_diagram.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;

        for key in ["../escape.png", "nested/file.png", ".hidden", ""] {
            let result = store.save(key, vec![1], "image/png").await;
            assert!(result.is_err(), "key {:?} should be rejected", key);
        }
    }
}
