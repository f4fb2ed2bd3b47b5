use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::features::questions::handlers::{
    create_answer, create_question, delete_answer, delete_question, get_thread, list_questions,
};
use crate::features::questions::services::PostService;

/// Create routes for the questions feature
///
/// `body_limit` caps multipart uploads, attachments included.
pub fn routes(post_service: Arc<PostService>, body_limit: usize) -> Router {
    Router::new()
        .route("/api/questions", get(list_questions).post(create_question))
        .route(
            "/api/questions/{question_id}",
            get(get_thread).delete(delete_question),
        )
        .route(
            "/api/questions/{question_id}/answers",
            post(create_answer),
        )
        .route(
            "/api/questions/{question_id}/answers/{answer_id}",
            delete(delete_answer),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(post_service)
}
