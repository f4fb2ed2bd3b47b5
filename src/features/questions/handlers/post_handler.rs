use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::questions::dtos::{
    AdminKeyDto, AnswerResponseDto, CreatePostFormDto, DeleteAnswerResponseDto,
    DeleteQuestionResponseDto, PostSubmission, QuestionResponseDto, ThreadResponseDto,
};
use crate::features::questions::services::{FileCandidate, PostService};
use crate::shared::constants::{FILE_FIELDS, TEXT_FIELDS};
use crate::shared::types::{ApiResponse, Meta};

/// List all questions, newest first
#[utoipa::path(
    get,
    path = "/api/questions",
    tag = "questions",
    responses(
        (status = 200, description = "Questions retrieved", body = ApiResponse<Vec<QuestionResponseDto>>)
    )
)]
pub async fn list_questions(
    State(service): State<Arc<PostService>>,
) -> Result<Json<ApiResponse<Vec<QuestionResponseDto>>>, AppError> {
    let questions = service.list_questions().await?;
    let total = questions.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(questions),
        None,
        Some(Meta { total }),
    )))
}

/// Get a question with its answers
#[utoipa::path(
    get,
    path = "/api/questions/{question_id}",
    tag = "questions",
    params(
        ("question_id" = Uuid, Path, description = "Question ID")
    ),
    responses(
        (status = 200, description = "Thread retrieved", body = ApiResponse<ThreadResponseDto>),
        (status = 404, description = "Question not found")
    )
)]
pub async fn get_thread(
    State(service): State<Arc<PostService>>,
    Path(question_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ThreadResponseDto>>, AppError> {
    let thread = service.get_thread(question_id).await?;
    Ok(Json(ApiResponse::success(Some(thread), None, None)))
}

/// Ask a question
///
/// Accepts multipart/form-data with:
/// - `text` (or `question`): markdown text, may be empty when files are attached
/// - `image` / `files` / `file`: any number of files; disallowed types are dropped
#[utoipa::path(
    post,
    path = "/api/questions",
    tag = "questions",
    request_body(
        content = CreatePostFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Question created", body = ApiResponse<QuestionResponseDto>),
        (status = 400, description = "Neither text nor a valid attachment"),
        (status = 413, description = "Request body too large"),
        (status = 502, description = "File storage unavailable")
    )
)]
pub async fn create_question(
    State(service): State<Arc<PostService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<QuestionResponseDto>>), AppError> {
    let submission = read_submission(multipart).await?;
    let question = service.create_question(submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(question),
            Some("Question posted".to_string()),
            None,
        )),
    ))
}

/// Answer a question
#[utoipa::path(
    post,
    path = "/api/questions/{question_id}/answers",
    tag = "questions",
    params(
        ("question_id" = Uuid, Path, description = "Question ID")
    ),
    request_body(
        content = CreatePostFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Answer created", body = ApiResponse<AnswerResponseDto>),
        (status = 400, description = "Neither text nor a valid attachment"),
        (status = 404, description = "Question not found"),
        (status = 413, description = "Request body too large"),
        (status = 502, description = "File storage unavailable")
    )
)]
pub async fn create_answer(
    State(service): State<Arc<PostService>>,
    Path(question_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<AnswerResponseDto>>), AppError> {
    let submission = read_submission(multipart).await?;
    let answer = service.create_answer(question_id, submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(answer),
            Some("Answer posted".to_string()),
            None,
        )),
    ))
}

/// Delete a question and all of its answers
#[utoipa::path(
    delete,
    path = "/api/questions/{question_id}",
    tag = "questions",
    params(
        ("question_id" = Uuid, Path, description = "Question ID")
    ),
    request_body = AdminKeyDto,
    responses(
        (status = 200, description = "Question deleted", body = ApiResponse<DeleteQuestionResponseDto>),
        (status = 403, description = "Wrong admin key"),
        (status = 404, description = "Question not found")
    )
)]
pub async fn delete_question(
    State(service): State<Arc<PostService>>,
    Path(question_id): Path<Uuid>,
    AppJson(dto): AppJson<AdminKeyDto>,
) -> Result<Json<ApiResponse<DeleteQuestionResponseDto>>, AppError> {
    let outcome = service.delete_question(question_id, &dto.admin_key).await?;

    Ok(Json(ApiResponse::success(
        Some(outcome),
        Some("Question deleted".to_string()),
        None,
    )))
}

/// Delete a single answer
#[utoipa::path(
    delete,
    path = "/api/questions/{question_id}/answers/{answer_id}",
    tag = "questions",
    params(
        ("question_id" = Uuid, Path, description = "Question ID"),
        ("answer_id" = Uuid, Path, description = "Answer ID")
    ),
    request_body = AdminKeyDto,
    responses(
        (status = 200, description = "Answer deleted", body = ApiResponse<DeleteAnswerResponseDto>),
        (status = 403, description = "Wrong admin key"),
        (status = 404, description = "Answer not found")
    )
)]
pub async fn delete_answer(
    State(service): State<Arc<PostService>>,
    Path((question_id, answer_id)): Path<(Uuid, Uuid)>,
    AppJson(dto): AppJson<AdminKeyDto>,
) -> Result<Json<ApiResponse<DeleteAnswerResponseDto>>, AppError> {
    service
        .delete_answer(question_id, answer_id, &dto.admin_key)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteAnswerResponseDto { deleted: true }),
        Some("Answer deleted".to_string()),
        None,
    )))
}

/// Collect the post text and uploaded files from a multipart body
///
/// The first text field wins. File fields without a filename are kept so the
/// resolver can report them as skipped.
async fn read_submission(mut multipart: Multipart) -> Result<PostSubmission, AppError> {
    let mut submission = PostSubmission::default();
    let mut text_seen = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("multipart data", e))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        if TEXT_FIELDS.contains(&field_name.as_str()) {
            let text = field
                .text()
                .await
                .map_err(|e| multipart_error(&field_name, e))?;
            if !text_seen {
                submission.text = text;
                text_seen = true;
            }
        } else if FILE_FIELDS.contains(&field_name.as_str()) {
            let filename = field.file_name().unwrap_or("").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| multipart_error(&filename, e))?;

            submission.files.push(FileCandidate {
                filename,
                data: data.to_vec(),
            });
        } else {
            debug!("Ignoring unknown field: {}", field_name);
        }
    }

    Ok(submission)
}

fn multipart_error(part: &str, e: MultipartError) -> AppError {
    debug!("Failed to read {}: {}", part, e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Request body too large: {}", e.body_text()))
    } else {
        AppError::BadRequest(format!("Failed to read {}: {}", part, e.body_text()))
    }
}
