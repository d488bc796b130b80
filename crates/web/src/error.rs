use assistant::AssistantError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use export::ExportError;
use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Assistant(AssistantError),
    Export(ExportError),
    Validation(ValidationErrors),
    Unauthorized,
    NotFound(&'static str),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Assistant(e) => write!(f, "Assistant error: {}", e),
            Self::Export(e) => write!(f, "Export error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::NotFound(what) => write!(f, "{}", what),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            Self::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            Self::Storage(StorageError::ConstraintViolation(_)) => StatusCode::CONFLICT,
            Self::Storage(StorageError::SyncFailed(_)) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Assistant(AssistantError::EmptyQuestion) => StatusCode::BAD_REQUEST,
            Self::Assistant(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = match &self {
            Self::Storage(StorageError::NotFound) => {
                json!({
                    "error": "Resource not found"
                })
            }
            Self::Storage(StorageError::ConstraintViolation(msg)) => {
                json!({
                    "error": msg
                })
            }
            Self::Storage(StorageError::SyncFailed(msg)) => {
                tracing::warn!("Backend write failed: {}", msg);
                json!({
                    "error": "The change was saved locally but could not be stored in the database",
                    "saved_locally": true
                })
            }
            Self::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                json!({
                    "error": "An internal error occurred"
                })
            }
            Self::Assistant(AssistantError::EmptyQuestion) => {
                json!({
                    "error": "Question must not be empty"
                })
            }
            Self::Assistant(e) => {
                tracing::error!("Assistant error: {:?}", e);
                json!({
                    "error": "The rules assistant is unavailable"
                })
            }
            Self::Export(e) => {
                tracing::error!("Export error: {:?}", e);
                json!({
                    "error": "The standings sheet could not be rendered"
                })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "error": "Validation failed",
                    "details": field_errors
                })
            }
            Self::Unauthorized => {
                json!({
                    "error": "Unauthorized"
                })
            }
            Self::NotFound(what) => {
                json!({
                    "error": what
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<AssistantError> for WebError {
    fn from(error: AssistantError) -> Self {
        Self::Assistant(error)
    }
}

impl From<ExportError> for WebError {
    fn from(error: ExportError) -> Self {
        Self::Export(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

pub type ApiResult<T> = Result<T, WebError>;
