use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ErrorResponse;

/// Reasons an uploaded file or upload request is refused.
///
/// Each variant renders as a machine-readable `code` in the 400 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejection {
    SizeLimit,
    UnexpectedField,
    InvalidType,
    NoFile,
    Malformed,
    InvalidSignature,
    UnknownAction,
}

impl UploadRejection {
    pub fn code(&self) -> &'static str {
        match self {
            UploadRejection::SizeLimit => "size-limit",
            UploadRejection::UnexpectedField => "unexpected-field",
            UploadRejection::InvalidType => "invalid-type",
            UploadRejection::NoFile => "no-file",
            UploadRejection::Malformed => "malformed",
            UploadRejection::InvalidSignature => "invalid-signature",
            UploadRejection::UnknownAction => "unknown-action",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UploadRejection::SizeLimit => "File too large. Maximum size is 4 MB",
            UploadRejection::UnexpectedField => "Unexpected file field",
            UploadRejection::InvalidType => "Only image files are allowed",
            UploadRejection::NoFile => "No file provided",
            UploadRejection::Malformed => "Error processing file",
            UploadRejection::InvalidSignature => "Invalid callback signature",
            UploadRejection::UnknownAction => "Unknown upload action",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upload rejected: {}", .0.code())]
    UploadRejected(UploadRejection),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// Upstream failure surfaced to the caller with a fixed endpoint message
    #[error("{context}: {detail}")]
    Upstream {
        context: &'static str,
        detail: String,
    },
}

impl AppError {
    /// Wrap server-side failures with the endpoint's public message.
    ///
    /// Client errors (4xx) pass through unchanged.
    pub fn in_context(self, context: &'static str) -> Self {
        match self {
            AppError::ExternalServiceError(detail) | AppError::Internal(detail) => {
                AppError::Upstream { context, detail }
            }
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::UploadRejected(reason) => (
                StatusCode::BAD_REQUEST,
                reason.message().to_string(),
                Some(reason.code()),
            ),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::ExternalServiceError(ref msg) => {
                tracing::error!("External service error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "External service error".to_string(),
                    None,
                )
            }
            AppError::Upstream { context, ref detail } => {
                tracing::error!("{}: {}", context, detail);
                (StatusCode::INTERNAL_SERVER_ERROR, context.to_string(), None)
            }
        };

        let body = Json(ErrorResponse { message, code });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
