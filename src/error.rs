use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MultiindexError {
    #[error("Invalid tenant name: {0:?}")]
    InvalidTenant(String),

    #[error("Missing or invalid credentials")]
    Unauthorized,

    #[error("Malformed path: {0}")]
    InvalidPath(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Forbidden path: {0}")]
    Forbidden(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Field not found in schema: {0}")]
    FieldNotFound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Tantivy error: {0}")]
    Tantivy(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, MultiindexError>;

impl From<std::io::Error> for MultiindexError {
    fn from(e: std::io::Error) -> Self {
        MultiindexError::Io(e.to_string())
    }
}

impl From<tantivy::TantivyError> for MultiindexError {
    fn from(e: tantivy::TantivyError) -> Self {
        MultiindexError::Tantivy(e.to_string())
    }
}

impl From<serde_json::Error> for MultiindexError {
    fn from(e: serde_json::Error) -> Self {
        MultiindexError::Json(e.to_string())
    }
}

impl MultiindexError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MultiindexError::InvalidTenant(_) => StatusCode::BAD_REQUEST,
            MultiindexError::Unauthorized => StatusCode::UNAUTHORIZED,
            MultiindexError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            MultiindexError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            MultiindexError::MissingField(_) => StatusCode::BAD_REQUEST,
            MultiindexError::UnsupportedContentType(_) => StatusCode::NOT_ACCEPTABLE,
            MultiindexError::Forbidden(_) => StatusCode::FORBIDDEN,
            MultiindexError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            MultiindexError::FieldNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MultiindexError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MultiindexError::Tantivy(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MultiindexError::Json(_) => StatusCode::BAD_REQUEST,
            MultiindexError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures of the storage layer rather than of the request.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            MultiindexError::FieldNotFound(_)
                | MultiindexError::Io(_)
                | MultiindexError::Tantivy(_)
        )
    }
}

// Axum IntoResponse implementation (feature-gated)
#[cfg(feature = "axum-support")]
use axum::response::{IntoResponse, Json, Response};
#[cfg(feature = "axum-support")]
use serde::Serialize;

#[cfg(feature = "axum-support")]
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub status: u16,
}

#[cfg(feature = "axum-support")]
impl IntoResponse for MultiindexError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        // Storage details stay in the log.
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = Json(ErrorResponse {
            message,
            status: status.as_u16(),
        });

        match self {
            MultiindexError::Unauthorized => (
                status,
                [(http::header::WWW_AUTHENTICATE, "Basic realm=\"multiindex\"")],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}
