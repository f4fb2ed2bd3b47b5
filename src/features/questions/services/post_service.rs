use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::questions::dtos::{
    AnswerResponseDto, DeleteQuestionResponseDto, PostSubmission, QuestionResponseDto,
    ThreadResponseDto,
};
use crate::features::questions::models::{NewPost, EMPTY_POST_MESSAGE};
use crate::features::questions::services::AttachmentResolver;
use crate::features::questions::store::ThreadStore;
use crate::modules::storage::BlobStore;
use crate::shared::admin_key::AdminKey;
use crate::shared::profanity::Censor;

/// Service for creating, reading and deleting questions and answers
pub struct PostService {
    store: Arc<dyn ThreadStore>,
    resolver: AttachmentResolver,
    censor: Arc<Censor>,
    admin_key: AdminKey,
}

impl PostService {
    pub fn new(
        store: Arc<dyn ThreadStore>,
        blob_store: Arc<dyn BlobStore>,
        censor: Arc<Censor>,
        admin_key: AdminKey,
    ) -> Self {
        Self {
            store,
            resolver: AttachmentResolver::new(blob_store),
            censor,
            admin_key,
        }
    }

    /// All questions, newest first, rendered for display
    pub async fn list_questions(&self) -> Result<Vec<QuestionResponseDto>> {
        let questions = self.store.list_questions().await?;
        Ok(questions.into_iter().map(Into::into).collect())
    }

    /// A question and its answers, oldest answer first
    pub async fn get_thread(&self, question_id: Uuid) -> Result<ThreadResponseDto> {
        let question = self
            .store
            .find_question(question_id)
            .await?
            .ok_or_else(|| question_not_found(question_id))?;

        let answers = self.store.list_answers(question_id).await?;

        Ok(ThreadResponseDto {
            question: question.into(),
            answers: answers.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn create_question(&self, submission: PostSubmission) -> Result<QuestionResponseDto> {
        let post = self.prepare(submission).await?;
        let question = self.store.insert_question(post).await.inspect_err(log_external)?;

        info!(
            "Question created: id={}, attachments={}",
            question.id,
            question.attachments.len()
        );

        Ok(question.into())
    }

    /// Fails with `NotFound` before any file is stored when the question is missing
    pub async fn create_answer(
        &self,
        question_id: Uuid,
        submission: PostSubmission,
    ) -> Result<AnswerResponseDto> {
        if self.store.find_question(question_id).await?.is_none() {
            return Err(question_not_found(question_id));
        }

        let post = self.prepare(submission).await?;
        let answer = self
            .store
            .insert_answer(question_id, post)
            .await
            .inspect_err(log_external)?;

        info!(
            "Answer created: id={}, question_id={}, attachments={}",
            answer.id,
            question_id,
            answer.attachments.len()
        );

        Ok(answer.into())
    }

    /// Delete a question together with all of its answers
    ///
    /// Attachment blobs are left on storage.
    pub async fn delete_question(
        &self,
        question_id: Uuid,
        presented_key: &str,
    ) -> Result<DeleteQuestionResponseDto> {
        self.authorize(presented_key)?;

        let outcome = self.store.delete_question_cascade(question_id).await?;
        if outcome.questions == 0 {
            if outcome.answers > 0 {
                warn!(
                    "Removed {} orphaned answers of missing question {}",
                    outcome.answers, question_id
                );
            }
            return Err(question_not_found(question_id));
        }

        info!(
            "Question deleted: id={}, answers_deleted={}",
            question_id, outcome.answers
        );

        Ok(DeleteQuestionResponseDto {
            deleted: true,
            answers_deleted: outcome.answers,
        })
    }

    pub async fn delete_answer(
        &self,
        question_id: Uuid,
        answer_id: Uuid,
        presented_key: &str,
    ) -> Result<()> {
        self.authorize(presented_key)?;

        let removed = self.store.delete_answer(question_id, answer_id).await?;
        if removed == 0 {
            return Err(AppError::NotFound(format!(
                "Answer {} not found on question {}",
                answer_id, question_id
            )));
        }

        info!("Answer deleted: id={}, question_id={}", answer_id, question_id);
        Ok(())
    }

    /// Censor the text, store the files and enforce the non-empty rule
    async fn prepare(&self, submission: PostSubmission) -> Result<NewPost> {
        let text = submission.text.trim();
        if self.censor.contains_profanity(text) {
            debug!("Masking profanity in submitted text");
        }
        let text = self.censor.censor(text);
        let attachments = self
            .resolver
            .resolve(submission.files)
            .await
            .inspect_err(log_external)?;

        let post = NewPost { text, attachments };
        post.validate()
            .map_err(|_| AppError::Validation(EMPTY_POST_MESSAGE.to_string()))?;

        Ok(post)
    }

    fn authorize(&self, presented_key: &str) -> Result<()> {
        if self.admin_key.verify(presented_key) {
            Ok(())
        } else {
            warn!("Rejected delete with wrong admin key");
            Err(AppError::Forbidden(
                "Not allowed. Wrong admin key.".to_string(),
            ))
        }
    }
}

fn question_not_found(question_id: Uuid) -> AppError {
    AppError::NotFound(format!("Question {} not found", question_id))
}

fn log_external(e: &AppError) {
    if e.is_external() {
        warn!("Collaborator failure while creating post: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::questions::services::FileCandidate;
    use crate::shared::test_helpers::{test_forum, TEST_ADMIN_KEY};

    fn text(t: &str) -> PostSubmission {
        PostSubmission {
            text: t.to_string(),
            files: Vec::new(),
        }
    }

    fn with_files(t: &str, names: &[&str]) -> PostSubmission {
        PostSubmission {
            text: t.to_string(),
            files: names
                .iter()
                .map(|n| FileCandidate {
                    filename: n.to_string(),
                    data: vec![0u8; 4],
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_text_is_censored_before_storage() {
        let forum = test_forum();
        let created = forum
            .service
            .create_question(text("I hate spam"))
            .await
            .unwrap();

        let stored = forum.store.find_question(created.id).await.unwrap().unwrap();
        assert_eq!(stored.text, "I hate ****");
        assert_eq!(created.text_html, "<p>I hate ****</p>\n");
    }

    #[tokio::test]
    async fn test_text_is_trimmed() {
        let forum = test_forum();
        let created = forum
            .service
            .create_question(text("  hello \n"))
            .await
            .unwrap();
        assert_eq!(created.text, "hello");
    }

    #[tokio::test]
    async fn test_empty_post_rejected_for_every_empty_combination() {
        let forum = test_forum();
        let empties = [
            text(""),
            text("   \n\t"),
            with_files("", &[]),
            with_files(" ", &["diagram.exe"]),
            with_files("", &["", "noextension"]),
        ];

        for submission in empties {
            let result = forum.service.create_question(submission).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }

        assert!(forum.store.list_questions().await.unwrap().is_empty());
        assert_eq!(forum.blobs.len(), 0);
    }

    #[tokio::test]
    async fn test_attachment_only_question_accepted() {
        let forum = test_forum();
        let created = forum
            .service
            .create_question(with_files("", &["slides.PPTX"]))
            .await
            .unwrap();

        assert_eq!(created.text, "");
        assert_eq!(created.attachments.len(), 1);
        assert_eq!(created.attachments[0].file_type, "pptx");
        assert_eq!(created.attachments[0].name, "slides.PPTX");
    }

    #[tokio::test]
    async fn test_bad_extension_dropped_post_still_created() {
        let forum = test_forum();
        let created = forum
            .service
            .create_question(with_files("see attached", &["diagram.exe"]))
            .await
            .unwrap();

        assert!(created.attachments.is_empty());
        assert_eq!(forum.blobs.len(), 0);
    }

    #[tokio::test]
    async fn test_answer_to_missing_question_stores_nothing() {
        let forum = test_forum();
        let result = forum
            .service
            .create_answer(Uuid::now_v7(), with_files("answer", &["a.png"]))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(forum.blobs.len(), 0);
    }

    #[tokio::test]
    async fn test_thread_lists_answers_oldest_first() {
        let forum = test_forum();
        let q = forum.service.create_question(text("q")).await.unwrap();
        let first = forum.service.create_answer(q.id, text("first")).await.unwrap();
        let second = forum
            .service
            .create_answer(q.id, text("~second~"))
            .await
            .unwrap();

        let thread = forum.service.get_thread(q.id).await.unwrap();
        let ids: Vec<Uuid> = thread.answers.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert!(thread.answers[1].text_html.contains("<sub>second</sub>"));
    }

    #[tokio::test]
    async fn test_delete_question_cascades() {
        let forum = test_forum();
        let q = forum.service.create_question(text("q")).await.unwrap();
        let mut answer_ids = Vec::new();
        for i in 0..3 {
            let a = forum
                .service
                .create_answer(q.id, text(&format!("answer {}", i)))
                .await
                .unwrap();
            answer_ids.push(a.id);
        }

        let result = forum
            .service
            .delete_question(q.id, TEST_ADMIN_KEY)
            .await
            .unwrap();
        assert!(result.deleted);
        assert_eq!(result.answers_deleted, 3);

        for id in answer_ids {
            assert!(forum.store.find_answer(id).await.unwrap().is_none());
        }
        assert!(matches!(
            forum.service.get_thread(q.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_key_removes_nothing() {
        let forum = test_forum();
        let q = forum.service.create_question(text("q")).await.unwrap();
        let a = forum.service.create_answer(q.id, text("a")).await.unwrap();

        let result = forum.service.delete_question(q.id, "guess").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let result = forum.service.delete_answer(q.id, a.id, "").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let thread = forum.service.get_thread(q.id).await.unwrap();
        assert_eq!(thread.answers.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_question_is_not_found() {
        let forum = test_forum();
        let result = forum
            .service
            .delete_question(Uuid::now_v7(), TEST_ADMIN_KEY)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_answer_leaves_question() {
        let forum = test_forum();
        let q = forum.service.create_question(text("q")).await.unwrap();
        let keep = forum.service.create_answer(q.id, text("keep")).await.unwrap();
        let drop = forum.service.create_answer(q.id, text("drop")).await.unwrap();

        forum
            .service
            .delete_answer(q.id, drop.id, TEST_ADMIN_KEY)
            .await
            .unwrap();

        let thread = forum.service.get_thread(q.id).await.unwrap();
        let ids: Vec<Uuid> = thread.answers.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![keep.id]);

        let again = forum
            .service
            .delete_answer(q.id, drop.id, TEST_ADMIN_KEY)
            .await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }
}
