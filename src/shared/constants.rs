/// File extensions accepted as attachments (compared lower-cased)
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "pdf", "docx", "pptx", "mp4", "mov", "mp3",
];

/// Multipart field names carrying post text; the first one sent wins
pub const TEXT_FIELDS: &[&str] = &["text", "question", "answer"];

/// Multipart field names carrying uploaded files
///
/// `image` is the name older forms used for every kind of file.
pub const FILE_FIELDS: &[&str] = &["image", "files", "file"];

/// Mask character used by the profanity censor
pub const CENSOR_CHAR: char = '*';

/// Check whether a lower-cased extension is on the allow-list
pub fn is_extension_allowed(extension: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension)
}

/// MIME type handed to the blob store for an allow-listed extension
pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}
