use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::questions::models::{Answer, NewPost, Question};
use crate::features::questions::store::{CascadeOutcome, ThreadStore};

/// Process-local thread store
///
/// Used when no database is configured. Records carry an insertion sequence
/// so posts sharing a timestamp keep a stable order.
#[derive(Default)]
pub struct MemoryThreadStore {
    inner: RwLock<Collections>,
}

#[derive(Default)]
struct Collections {
    questions: Vec<(u64, Question)>,
    answers: Vec<(u64, Answer)>,
    next_seq: u64,
}

impl Collections {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

impl MemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadStore for MemoryThreadStore {
    async fn insert_question(&self, post: NewPost) -> Result<Question> {
        let mut inner = self.inner.write().await;
        let question = Question {
            id: Uuid::now_v7(),
            text: post.text,
            attachments: post.attachments,
            timestamp: Utc::now(),
        };
        let seq = inner.next_seq();
        inner.questions.push((seq, question.clone()));
        Ok(question)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>> {
        let inner = self.inner.read().await;
        Ok(inner
            .questions
            .iter()
            .find(|(_, q)| q.id == id)
            .map(|(_, q)| q.clone()))
    }

    async fn list_questions(&self) -> Result<Vec<Question>> {
        let inner = self.inner.read().await;
        let mut questions: Vec<&(u64, Question)> = inner.questions.iter().collect();
        questions.sort_by(|(sa, a), (sb, b)| b.timestamp.cmp(&a.timestamp).then(sb.cmp(sa)));
        Ok(questions.into_iter().map(|(_, q)| q.clone()).collect())
    }

    async fn insert_answer(&self, question_id: Uuid, post: NewPost) -> Result<Answer> {
        // Existence check and insert share the write lock
        let mut inner = self.inner.write().await;
        if !inner.questions.iter().any(|(_, q)| q.id == question_id) {
            return Err(AppError::NotFound(format!(
                "Question {} not found",
                question_id
            )));
        }

        let answer = Answer {
            id: Uuid::now_v7(),
            question_id,
            text: post.text,
            attachments: post.attachments,
            timestamp: Utc::now(),
        };
        let seq = inner.next_seq();
        inner.answers.push((seq, answer.clone()));
        Ok(answer)
    }

    async fn find_answer(&self, id: Uuid) -> Result<Option<Answer>> {
        let inner = self.inner.read().await;
        Ok(inner
            .answers
            .iter()
            .find(|(_, a)| a.id == id)
            .map(|(_, a)| a.clone()))
    }

    async fn list_answers(&self, question_id: Uuid) -> Result<Vec<Answer>> {
        let inner = self.inner.read().await;
        let mut answers: Vec<&(u64, Answer)> = inner
            .answers
            .iter()
            .filter(|(_, a)| a.question_id == question_id)
            .collect();
        answers.sort_by(|(sa, a), (sb, b)| a.timestamp.cmp(&b.timestamp).then(sa.cmp(sb)));
        Ok(answers.into_iter().map(|(_, a)| a.clone()).collect())
    }

    async fn delete_question_cascade(&self, id: Uuid) -> Result<CascadeOutcome> {
        let mut inner = self.inner.write().await;

        let questions_before = inner.questions.len();
        inner.questions.retain(|(_, q)| q.id != id);
        let answers_before = inner.answers.len();
        inner.answers.retain(|(_, a)| a.question_id != id);

        Ok(CascadeOutcome {
            questions: (questions_before - inner.questions.len()) as u64,
            answers: (answers_before - inner.answers.len()) as u64,
        })
    }

    async fn delete_answer(&self, question_id: Uuid, answer_id: Uuid) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.answers.len();
        inner
            .answers
            .retain(|(_, a)| !(a.id == answer_id && a.question_id == question_id));
        Ok((before - inner.answers.len()) as u64)
    }
}
