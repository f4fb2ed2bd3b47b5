use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::questions::models::Attachment;
use crate::modules::storage::BlobStore;
use crate::shared::constants::{content_type_for_extension, is_extension_allowed};
use crate::shared::validation::{file_extension, sanitize_filename};

/// Uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Why a candidate was dropped instead of becoming an attachment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("empty filename")]
    EmptyFilename,

    #[error("filename has no extension")]
    MissingExtension,

    #[error("extension '{0}' is not allowed")]
    DisallowedExtension(String),
}

/// Lower-cased extension of an acceptable filename
pub fn classify(filename: &str) -> std::result::Result<String, SkipReason> {
    if filename.trim().is_empty() {
        return Err(SkipReason::EmptyFilename);
    }

    let extension = file_extension(filename).ok_or(SkipReason::MissingExtension)?;
    if !is_extension_allowed(&extension) {
        return Err(SkipReason::DisallowedExtension(extension));
    }

    Ok(extension)
}

/// Unique storage key: `{uuid_v7}_{sanitized stem}.{extension}`
pub fn storage_key(filename: &str, extension: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);

    let mut safe_stem = sanitize_filename(stem);
    if safe_stem.is_empty() {
        safe_stem.push_str("file");
    }

    format!("{}_{}.{}", Uuid::now_v7().simple(), safe_stem, extension)
}

/// Turns uploaded files into stored attachments
pub struct AttachmentResolver {
    blob_store: Arc<dyn BlobStore>,
}

impl AttachmentResolver {
    pub fn new(blob_store: Arc<dyn BlobStore>) -> Self {
        Self { blob_store }
    }

    /// Validate and store each candidate in order
    ///
    /// Invalid candidates are skipped. A storage failure aborts the whole
    /// call; blobs saved before it are left in place.
    pub async fn resolve(&self, candidates: Vec<FileCandidate>) -> Result<Vec<Attachment>> {
        let mut attachments = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let extension = match classify(&candidate.filename) {
                Ok(extension) => extension,
                Err(reason) => {
                    warn!(
                        "Skipping attachment '{}': {}",
                        candidate.filename, reason
                    );
                    continue;
                }
            };

            let key = storage_key(&candidate.filename, &extension);
            let size = candidate.data.len();
            let url = self
                .blob_store
                .save(&key, candidate.data, content_type_for_extension(&extension))
                .await?;

            debug!(
                "Attachment stored: name={}, key={}, size={}",
                candidate.filename, key, size
            );

            attachments.push(Attachment {
                url,
                file_type: extension,
                name: candidate.filename,
            });
        }

        Ok(attachments)
    }
}
