use utoipa::{Modify, OpenApi};

use crate::features::questions::{dtos as questions_dtos, handlers as questions_handlers};
use crate::features::questions::models::Attachment;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        questions_handlers::list_questions,
        questions_handlers::get_thread,
        questions_handlers::create_question,
        questions_handlers::create_answer,
        questions_handlers::delete_question,
        questions_handlers::delete_answer,
    ),
    components(
        schemas(
            Meta,
            Attachment,
            questions_dtos::CreatePostFormDto,
            questions_dtos::QuestionResponseDto,
            questions_dtos::AnswerResponseDto,
            questions_dtos::ThreadResponseDto,
            questions_dtos::AdminKeyDto,
            questions_dtos::DeleteQuestionResponseDto,
            questions_dtos::DeleteAnswerResponseDto,
            ApiResponse<Vec<questions_dtos::QuestionResponseDto>>,
            ApiResponse<questions_dtos::QuestionResponseDto>,
            ApiResponse<questions_dtos::AnswerResponseDto>,
            ApiResponse<questions_dtos::ThreadResponseDto>,
            ApiResponse<questions_dtos::DeleteQuestionResponseDto>,
            ApiResponse<questions_dtos::DeleteAnswerResponseDto>,
        )
    ),
    tags(
        (name = "questions", description = "Questions, answers and admin deletion"),
    ),
    info(
        title = "Student Forum API",
        version = "0.1.0",
        description = "Question and answer forum with markdown, attachments and a profanity filter",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_question_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/api/questions",
            "/api/questions/{question_id}",
            "/api/questions/{question_id}/answers",
            "/api/questions/{question_id}/answers/{answer_id}",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "{}", expected);
        }
    }

    #[test]
    fn test_info_modifier_overrides_title() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Forum".to_string(),
            version: "9".to_string(),
            description: "d".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Forum");
        assert_eq!(doc.info.version, "9");
    }
}
