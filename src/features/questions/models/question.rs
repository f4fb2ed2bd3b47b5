use std::borrow::Cow;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::Attachment;

/// Database model for questions
#[derive(Debug, Clone, FromRow)]
pub struct Question {
    pub id: Uuid,
    /// Censored, un-rendered markup
    pub text: String,
    #[sqlx(json)]
    pub attachments: Vec<Attachment>,
    pub timestamp: DateTime<Utc>,
}

/// Content of a question or answer about to be persisted
///
/// The text is already censored; id and timestamp are assigned by the store.
#[derive(Debug, Clone, Default, Validate)]
#[validate(schema(function = "validate_has_content"))]
pub struct NewPost {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

pub const EMPTY_POST_MESSAGE: &str = "A post needs text or at least one valid attachment";

fn validate_has_content(post: &NewPost) -> Result<(), ValidationError> {
    if post.text.is_empty() && post.attachments.is_empty() {
        return Err(
            ValidationError::new("empty_post").with_message(Cow::Borrowed(EMPTY_POST_MESSAGE))
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_post_is_invalid() {
        assert!(NewPost::default().validate().is_err());
    }

    #[test]
    fn test_text_or_attachment_is_enough() {
        let text_only = NewPost {
            text: "hello".to_string(),
            attachments: Vec::new(),
        };
        assert!(text_only.validate().is_ok());

        let file_only = NewPost {
            text: String::new(),
            attachments: vec![Attachment {
                url: "/uploads/x.png".to_string(),
                file_type: "png".to_string(),
                name: "x.png".to_string(),
            }],
        };
        assert!(file_only.validate().is_ok());
    }
}
