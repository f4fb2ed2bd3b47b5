use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use crate::core::error::AppError;
use crate::features::questions::routes;
use crate::features::questions::services::PostService;
use crate::features::questions::store::{MemoryThreadStore, ThreadStore};
use crate::modules::storage::BlobStore;
use crate::shared::admin_key::AdminKey;
use crate::shared::profanity::Censor;

pub const TEST_ADMIN_KEY: &str = "secret123";

/// Blob store keeping files in memory, optionally failing after `n` saves
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<Vec<(String, Vec<u8>)>>,
    fail_after: Option<usize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(saves: usize) -> Self {
        Self {
            blobs: Mutex::new(Vec::new()),
            fail_after: Some(saves),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.blobs
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        let mut blobs = self.blobs.lock().unwrap();
        if self.fail_after.is_some_and(|n| blobs.len() >= n) {
            return Err(AppError::Storage("blob store unavailable".to_string()));
        }
        blobs.push((key.to_string(), data));
        Ok(format!("mem://{}", key))
    }
}

/// Everything a post service test needs to inspect afterwards
pub struct TestForum {
    pub service: Arc<PostService>,
    pub store: Arc<MemoryThreadStore>,
    pub blobs: Arc<MemoryBlobStore>,
}

/// Post service over in-memory collaborators, censoring "spam"
pub fn test_forum() -> TestForum {
    let store = Arc::new(MemoryThreadStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let censor = Arc::new(Censor::new(["spam"]).unwrap());

    let service = Arc::new(PostService::new(
        store.clone() as Arc<dyn ThreadStore>,
        blobs.clone() as Arc<dyn BlobStore>,
        censor,
        AdminKey::new(TEST_ADMIN_KEY),
    ));

    TestForum {
        service,
        store,
        blobs,
    }
}

/// Question routes mounted over `forum`
pub fn test_router(forum: &TestForum) -> Router {
    routes::routes(Arc::clone(&forum.service), 1024 * 1024)
}
