use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::questions::models::{Answer, NewPost, Question};
use crate::features::questions::store::{CascadeOutcome, ThreadStore};

/// Postgres-backed thread store
pub struct PgThreadStore {
    pool: PgPool,
}

impl PgThreadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// The question was deleted between the existence check and the insert
fn answer_insert_error(question_id: Uuid, e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            AppError::NotFound(format!("Question {} not found", question_id))
        }
        other => AppError::Database(other),
    }
}

#[async_trait]
impl ThreadStore for PgThreadStore {
    async fn insert_question(&self, post: NewPost) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (text, attachments)
            VALUES ($1, $2)
            RETURNING id, text, attachments, created_at AS "timestamp"
            "#,
        )
        .bind(&post.text)
        .bind(Json(&post.attachments))
        .fetch_one(&self.pool)
        .await?;

        debug!("Question inserted: id={}", question.id);
        Ok(question)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, text, attachments, created_at AS "timestamp"
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    async fn list_questions(&self) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, text, attachments, created_at AS "timestamp"
            FROM questions
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list questions: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(questions)
    }

    async fn insert_answer(&self, question_id: Uuid, post: NewPost) -> Result<Answer> {
        let answer = sqlx::query_as::<_, Answer>(
            r#"
            INSERT INTO answers (question_id, text, attachments)
            VALUES ($1, $2, $3)
            RETURNING id, question_id, text, attachments, created_at AS "timestamp"
            "#,
        )
        .bind(question_id)
        .bind(&post.text)
        .bind(Json(&post.attachments))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| answer_insert_error(question_id, e))?;

        debug!(
            "Answer inserted: id={}, question_id={}",
            answer.id, answer.question_id
        );
        Ok(answer)
    }

    async fn find_answer(&self, id: Uuid) -> Result<Option<Answer>> {
        let answer = sqlx::query_as::<_, Answer>(
            r#"
            SELECT id, question_id, text, attachments, created_at AS "timestamp"
            FROM answers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(answer)
    }

    async fn list_answers(&self, question_id: Uuid) -> Result<Vec<Answer>> {
        let answers = sqlx::query_as::<_, Answer>(
            r#"
            SELECT id, question_id, text, attachments, created_at AS "timestamp"
            FROM answers
            WHERE question_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    async fn delete_question_cascade(&self, id: Uuid) -> Result<CascadeOutcome> {
        let mut tx = self.pool.begin().await?;

        let answers = sqlx::query("DELETE FROM answers WHERE question_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let questions = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!(
            "Question cascade delete: id={}, questions={}, answers={}",
            id, questions, answers
        );

        Ok(CascadeOutcome { questions, answers })
    }

    async fn delete_answer(&self, question_id: Uuid, answer_id: Uuid) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM answers WHERE id = $1 AND question_id = $2")
            .bind(answer_id)
            .bind(question_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct FakeDbError {
        message: String,
        foreign_key: bool,
    }

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            &self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.foreign_key {
                ErrorKind::ForeignKeyViolation
            } else {
                ErrorKind::UniqueViolation
            }
        }
    }

    fn db_error(foreign_key: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError {
            message: "insert or update on table \"answers\" violates a constraint".to_string(),
            foreign_key,
        }))
    }

    #[test]
    fn test_foreign_key_violation_is_not_found() {
        let id = Uuid::now_v7();
        let err = answer_insert_error(id, db_error(true));
        match err {
            AppError::NotFound(msg) => assert!(msg.contains(&id.to_string())),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_other_insert_errors_stay_database_errors() {
        let id = Uuid::now_v7();
        let err = answer_insert_error(id, db_error(false));
        assert!(matches!(err, AppError::Database(_)));

        let err = answer_insert_error(id, sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Database(_)));
    }

    /// Run with `DATABASE_URL` set and `--features postgres-tests`
    #[cfg(feature = "postgres-tests")]
    mod live {
        use chrono::{TimeZone, Utc};

        use super::*;

        fn post(text: &str) -> NewPost {
            NewPost {
                text: text.to_string(),
                attachments: Vec::new(),
            }
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn test_cascade_removes_answers_in_one_transaction(pool: PgPool) {
            let store = PgThreadStore::new(pool.clone());
            let q = store.insert_question(post("q")).await.unwrap();
            let other = store.insert_question(post("other")).await.unwrap();
            for i in 0..3 {
                store
                    .insert_answer(q.id, post(&format!("a{}", i)))
                    .await
                    .unwrap();
            }
            let kept = store.insert_answer(other.id, post("kept")).await.unwrap();

            let outcome = store.delete_question_cascade(q.id).await.unwrap();
            assert_eq!(outcome.questions, 1);
            assert_eq!(outcome.answers, 3);

            assert!(store.find_question(q.id).await.unwrap().is_none());
            assert!(store.list_answers(q.id).await.unwrap().is_empty());
            assert!(store.find_answer(kept.id).await.unwrap().is_some());

            let again = store.delete_question_cascade(q.id).await.unwrap();
            assert_eq!(again.questions, 0);
            assert_eq!(again.answers, 0);
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn test_answer_to_missing_question_is_not_found(pool: PgPool) {
            let store = PgThreadStore::new(pool);
            let result = store.insert_answer(Uuid::now_v7(), post("late")).await;
            assert!(matches!(result, Err(AppError::NotFound(_))));
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn test_equal_timestamps_keep_insertion_order(pool: PgPool) {
            let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
            let mut question_ids = Vec::new();
            for text in ["first", "second", "third"] {
                let id: Uuid = sqlx::query_scalar(
                    "INSERT INTO questions (text, created_at) VALUES ($1, $2) RETURNING id",
                )
                .bind(text)
                .bind(at)
                .fetch_one(&pool)
                .await
                .unwrap();
                question_ids.push(id);
            }

            let mut answer_ids = Vec::new();
            for text in ["a", "b", "c"] {
                let id: Uuid = sqlx::query_scalar(
                    "INSERT INTO answers (question_id, text, created_at) \
                     VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(question_ids[0])
                .bind(text)
                .bind(at)
                .fetch_one(&pool)
                .await
                .unwrap();
                answer_ids.push(id);
            }

            let store = PgThreadStore::new(pool);

            let listed: Vec<Uuid> = store
                .list_questions()
                .await
                .unwrap()
                .into_iter()
                .map(|q| q.id)
                .collect();
            question_ids.reverse();
            assert_eq!(listed, question_ids);

            let answers: Vec<Uuid> = store
                .list_answers(listed[2])
                .await
                .unwrap()
                .into_iter()
                .map(|a| a.id)
                .collect();
            assert_eq!(answers, answer_ids);
        }
    }
}
