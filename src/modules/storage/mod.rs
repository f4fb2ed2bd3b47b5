//! Blob storage for uploaded attachments
//!
//! `BlobStore` takes bytes plus a storage key and hands back a URL the file
//! can be fetched from. Keys are generated by the caller and are unique;
//! no overwrite or delete contract is required.

mod local;
mod minio_client;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use local::LocalBlobStore;
pub use minio_client::MinioBlobStore;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `data` under `key`, returning its retrievable URL
    async fn save(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> Result<String, AppError>;
}
