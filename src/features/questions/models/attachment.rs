use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stored file belonging to a question or an answer
///
/// Kept inline on the owning post, in upload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    /// Location the blob store returned for the file
    pub url: String,
    /// Lower-cased extension, always one of the allowed extensions
    #[serde(rename = "type")]
    pub file_type: String,
    /// Filename as supplied by the uploader, for display only
    pub name: String,
}
