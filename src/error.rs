use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::doc_processor::ExtractError;
use crate::llm::LlmError;

/// Request-level failures, each mapped to one status code and a structured
/// JSON body. Failures after the first streamed byte never come through
/// here; the relay ends those streams with a terminal marker instead.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Extraction(String),
    #[error("No document index for user '{0}'. Upload a document first.")]
    NotFound(String),
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Authentication(_) => "authentication_error",
            ApiError::Extraction(_) => "extraction_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::Upstream(_) => "upstream_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        warn!(status = %status, kind, "request failed: {}", self);
        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": kind,
            }
        }));
        (status, body).into_response()
    }
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        if e.is_auth() {
            ApiError::Authentication(e.to_string())
        } else {
            ApiError::Upstream(e.to_string())
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        ApiError::Extraction(e.to_string())
    }
}
