//! Persistence for questions and answers.
//!
//! `ThreadStore` is the seam between the post lifecycle and the document
//! store. Implementations must guarantee that once
//! `delete_question_cascade` returns, no answer referencing the question is
//! retrievable.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::questions::models::{Answer, NewPost, Question};

pub use memory::MemoryThreadStore;
pub use postgres::PgThreadStore;

/// Rows removed by a cascading question delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub questions: u64,
    pub answers: u64,
}

#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn insert_question(&self, post: NewPost) -> Result<Question>;

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>>;

    /// All questions, newest first
    async fn list_questions(&self) -> Result<Vec<Question>>;

    /// Fails with `NotFound` when the question does not exist
    async fn insert_answer(&self, question_id: Uuid, post: NewPost) -> Result<Answer>;

    async fn find_answer(&self, id: Uuid) -> Result<Option<Answer>>;

    /// Answers of one question, oldest first
    async fn list_answers(&self, question_id: Uuid) -> Result<Vec<Answer>>;

    /// Delete a question and every answer referencing it
    async fn delete_question_cascade(&self, id: Uuid) -> Result<CascadeOutcome>;

    /// Delete one answer of the given question, returning rows removed
    async fn delete_answer(&self, question_id: Uuid, answer_id: Uuid) -> Result<u64>;
}
