// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::exam::error::ExamError;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 403 Forbidden (valid identity, not eligible)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (event not legal in the current session state)
    Conflict(String),

    // 422 Unprocessable Entity (submission with unanswered questions)
    IncompleteSubmission { message: String, unanswered: Vec<i64> },

    // 503 Service Unavailable (retryable upstream failure)
    ServiceUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::IncompleteSubmission { message, unanswered } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "unanswered": unanswered }),
            ),
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": msg, "retryable": true }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Maps the exam taxonomy onto HTTP statuses.
impl From<ExamError> for AppError {
    fn from(err: ExamError) -> Self {
        let message = err.to_string();
        match err {
            ExamError::Validation(_)
            | ExamError::InvalidTestReference(_)
            | ExamError::UnknownQuestion(_)
            | ExamError::InvalidChoice { .. } => AppError::BadRequest(message),
            ExamError::AuthorizationDenied => AppError::Forbidden(message),
            ExamError::AuthorizationCheckFailed(_) | ExamError::QuestionLoadFailed(_) => {
                AppError::ServiceUnavailable(message)
            }
            ExamError::EmptyQuestionSet { .. } => AppError::NotFound(message),
            ExamError::IncompleteSubmission { unanswered } => {
                AppError::IncompleteSubmission { message, unanswered }
            }
            ExamError::InvalidTransition { .. } => AppError::Conflict(message),
            // Background saves surface as a warning on the snapshot. This arm serves callers
            // that await `ResultPersister::persist` directly.
            ExamError::PersistenceFailed(source) => {
                AppError::InternalServerError(format!("{message}: {source}"))
            }
        }
    }
}
