//! Common error types for the generation orchestrator

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to load model {style}: {message}")]
    ModelLoad { style: String, message: String },

    /// Resource-class failures (the "meta tensor" family) are deliberately
    /// vaguer than their underlying cause.
    #[error("Model loading issue. Please try again.")]
    ModelResource,

    #[error("Image generation failed: {0}")]
    Inference(String),

    #[error("No image was generated")]
    EmptyResult,

    #[error("Failed to save image: {0}")]
    ArtifactWrite(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Tag a pipeline failure as an inference error, keeping an already
    /// tagged message intact.
    pub(crate) fn inference(err: AppError) -> AppError {
        match err {
            AppError::Inference(_) => err,
            other => AppError::Inference(other.to_string()),
        }
    }
}

/// Error response format (OpenAI compatible)
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", None),
            AppError::ModelLoad { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "server_error",
                Some("model_load_failed"),
            ),
            AppError::ModelResource => (
                StatusCode::SERVICE_UNAVAILABLE,
                "server_error",
                Some("model_loading_issue"),
            ),
            AppError::Inference(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "generation_error",
                Some("generation_failed"),
            ),
            AppError::EmptyResult => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "generation_error",
                Some("no_image_generated"),
            ),
            AppError::ArtifactWrite(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                Some("artifact_write_failed"),
            ),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                r#type: error_type.to_string(),
                code: code.map(|c| c.to_string()),
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
