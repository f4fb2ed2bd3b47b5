mod attachment_resolver;
mod post_service;

pub use attachment_resolver::{AttachmentResolver, FileCandidate};
pub use post_service::PostService;
