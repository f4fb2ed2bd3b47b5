use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Attachment;

/// Database model for answers
#[derive(Debug, Clone, FromRow)]
pub struct Answer {
    pub id: Uuid,
    /// Owning question; deleting it deletes this answer
    pub question_id: Uuid,
    pub text: String,
    #[sqlx(json)]
    pub attachments: Vec<Attachment>,
    pub timestamp: DateTime<Utc>,
}
