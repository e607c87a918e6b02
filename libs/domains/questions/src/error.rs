use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::{AppError, ErrorCode};
use core_config::ConfigError;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

pub const UPLOAD_FIELDS_REQUIRED: &str = "Both 'question' and 'sql_query' are required.";
pub const SEARCH_QUESTION_REQUIRED: &str = "'question' parameter is required.";
pub const SEARCH_K_NOT_INTEGER: &str = "'k' must be an integer.";

#[derive(Debug, Error)]
pub enum QuestionError {
    /// A required input was missing or empty. The message is returned verbatim.
    #[error("{0}")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidParameter(&'static str),

    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),

    #[error(transparent)]
    InvalidQuery(#[from] QueryRejection),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: u32, actual: u32 },

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Index '{0}' is not ready")]
    IndexNotReady(String),

    #[error("Index '{name}' did not become ready within {waited:?}")]
    ProvisioningTimeout { name: String, waited: Duration },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type QuestionResult<T> = Result<T, QuestionError>;

impl From<ConfigError> for QuestionError {
    fn from(err: ConfigError) -> Self {
        QuestionError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for QuestionError {
    fn from(err: serde_json::Error) -> Self {
        QuestionError::Internal(format!("JSON error: {}", err))
    }
}

/// Convert QuestionError to AppError for the standard error envelope
impl From<QuestionError> for AppError {
    fn from(err: QuestionError) -> Self {
        match err {
            QuestionError::MissingField(msg) | QuestionError::InvalidParameter(msg) => {
                AppError::BadRequest(msg.to_string())
            }
            QuestionError::InvalidBody(rejection) => AppError::JsonExtractorRejection(rejection),
            QuestionError::InvalidQuery(rejection) => AppError::QueryExtractorRejection(rejection),
            err @ (QuestionError::Embedding(_) | QuestionError::DimensionMismatch { .. }) => {
                AppError::Upstream {
                    code: ErrorCode::EmbeddingProviderError,
                    detail: err.to_string(),
                }
            }
            QuestionError::VectorStore(detail) => AppError::Upstream {
                code: ErrorCode::VectorStoreError,
                detail,
            },
            err @ (QuestionError::IndexNotReady(_) | QuestionError::ProvisioningTimeout { .. }) => {
                AppError::ServiceUnavailable(err.to_string())
            }
            QuestionError::Config(msg) => {
                AppError::InternalServerError(format!("Config error: {}", msg))
            }
            QuestionError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

/// Missing or malformed parameters render as `{"error": "..."}`; everything
/// else goes through the shared error envelope.
impl IntoResponse for QuestionError {
    fn into_response(self) -> Response {
        match self {
            QuestionError::MissingField(msg) | QuestionError::InvalidParameter(msg) => {
                tracing::info!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            other => AppError::from(other).into_response(),
        }
    }
}
