use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::questions::models::{Answer, Attachment, Question};
use crate::features::questions::services::FileCandidate;
use crate::shared::markup;

/// Multipart form for creating a question or an answer
/// Note: This struct is for Swagger UI documentation only.
/// The handlers read the multipart stream directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreatePostFormDto {
    /// Post text in markdown; `question` and `answer` are accepted aliases
    #[schema(example = "How do I write H~2~O and x^^2^^?")]
    pub text: Option<String>,
    /// Files to attach; `files` is an accepted alias
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: Option<Vec<String>>,
}

/// Text and files parsed from a create request
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub text: String,
    pub files: Vec<FileCandidate>,
}

/// Response DTO for a question
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponseDto {
    pub id: Uuid,
    /// Stored (censored) markup
    pub text: String,
    /// `text` rendered to HTML
    pub text_html: String,
    pub timestamp: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
}

impl From<Question> for QuestionResponseDto {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            text_html: markup::render(&q.text),
            text: q.text,
            timestamp: q.timestamp,
            attachments: q.attachments,
        }
    }
}

/// Response DTO for an answer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnswerResponseDto {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub text_html: String,
    pub timestamp: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
}

impl From<Answer> for AnswerResponseDto {
    fn from(a: Answer) -> Self {
        Self {
            id: a.id,
            question_id: a.question_id,
            text_html: markup::render(&a.text),
            text: a.text,
            timestamp: a.timestamp,
            attachments: a.attachments,
        }
    }
}

/// A question with its answers, oldest answer first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadResponseDto {
    pub question: QuestionResponseDto,
    pub answers: Vec<AnswerResponseDto>,
}

/// Request DTO for admin deletions
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminKeyDto {
    /// Shared admin secret
    #[serde(default)]
    pub admin_key: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteQuestionResponseDto {
    pub deleted: bool,
    /// Answers removed together with the question
    pub answers_deleted: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteAnswerResponseDto {
    pub deleted: bool,
}
