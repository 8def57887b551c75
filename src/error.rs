use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{ERR_DB_UNAVAILABLE_DETAIL, RETRY_AFTER_SECS};
use crate::db::StoreError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Token signing error: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Username already exists")]
    UsernameTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Subject not found")]
    SubjectNotFound,

    #[error("Question not found")]
    QuestionNotFound,
}

impl AppError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Store(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_)
            | AppError::PasswordHash(_)
            | AppError::TokenSigning(_)
            | AppError::TaskJoin(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidInput(_) | AppError::UsernameTaken => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound | AppError::SubjectNotFound | AppError::QuestionNotFound => {
                StatusCode::NOT_FOUND
            }
        }
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error_message = match self {
            AppError::Store(ref e) if e.is_transient() => {
                tracing::error!("Database unavailable: {:?}", e);
                let body = Json(json!({
                    "error": "Database connection failed",
                    "message": ERR_DB_UNAVAILABLE_DETAIL,
                }));
                let mut response = (status, body).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
                return response;
            }
            AppError::Store(ref e) => {
                tracing::error!("Database error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::PasswordHash(ref e) => {
                tracing::error!("Password hashing error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::TokenSigning(ref e) => {
                tracing::error!("Token signing error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::TaskJoin(ref e) => {
                tracing::error!("Task join error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::InvalidInput(msg) => msg,
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::Unauthorized(msg) => msg.to_string(),
            AppError::UsernameTaken => "Username already exists".to_string(),
            AppError::UserNotFound => "User not found".to_string(),
            AppError::SubjectNotFound => "Subject not found".to_string(),
            AppError::QuestionNotFound => "Question not found".to_string(),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Unreadable request bodies are client errors like any other bad input
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
