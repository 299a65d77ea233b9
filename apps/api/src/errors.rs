use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cv::ContextError;
use crate::import::ImportError;
use crate::templates::TemplateSourceError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid CV data: {0}")]
    Context(#[from] ContextError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateSourceError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Context(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_CV",
                e.to_string(),
            ),
            AppError::Template(e) => match e {
                TemplateSourceError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "TEMPLATE_NOT_FOUND", e.to_string())
                }
                TemplateSourceError::InvalidId(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
                _ => {
                    tracing::error!("Template source error: {e}");
                    (
                        StatusCode::BAD_GATEWAY,
                        "TEMPLATE_SOURCE_ERROR",
                        "The template service could not be reached".to_string(),
                    )
                }
            },
            AppError::Import(e) => {
                let status = match e {
                    ImportError::MissingFile | ImportError::NotPdf => StatusCode::BAD_REQUEST,
                    ImportError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                    ImportError::Extraction(_) | ImportError::NoText => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                };
                (status, "IMPORT_ERROR", e.to_string())
            }
            AppError::Multipart(e) => (e.status(), "INVALID_UPLOAD", e.body_text()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
