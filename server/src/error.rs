use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clinic_db::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every failure a handler can report, mapped onto an HTTP status and a
/// machine-readable `detail` code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Missing, malformed, tampered or expired token. Carries no detail.
    #[error("unauthorized")]
    Unauthorized,

    /// Unknown login identifier or wrong password, deliberately identical.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{code}")]
    Conflict { code: String, message: String },

    /// Duplicate document, answered with 400 for existing clients.
    #[error("{0}")]
    Duplicate(String),

    #[error("store failure: {0}")]
    Store(#[source] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub field: Option<String>,
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::Duplicate(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (detail, message, field) = match self {
            ApiError::Validation { field, message } => {
                ("VALIDATION_ERROR", Some(message.clone()), Some(field.clone()))
            }
            ApiError::Unauthorized => ("UNAUTHORIZED", None, None),
            ApiError::InvalidCredentials => (
                "INVALID_CREDENTIALS",
                Some("Unknown identifier or wrong password".to_string()),
                None,
            ),
            ApiError::Forbidden => ("FORBIDDEN", None, None),
            ApiError::NotFound(message) => ("NOT_FOUND", Some(message.clone()), None),
            ApiError::Conflict { code, message } => {
                return ErrorBody {
                    detail: code.clone(),
                    message: Some(message.clone()),
                    field: None,
                }
            }
            ApiError::Duplicate(message) => ("DUPLICATE", Some(message.clone()), None),
            // Internal text stays in the logs.
            ApiError::Store(_) | ApiError::Internal(_) => ("INTERNAL_ERROR", None, None),
        };
        ErrorBody {
            detail: detail.to_string(),
            message,
            field,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { constraint } => {
                let code = if constraint.contains("username") {
                    "USERNAME_TAKEN"
                } else if constraint.contains("citizen_id") {
                    "CITIZEN_ID_TAKEN"
                } else {
                    "CONFLICT"
                };
                ApiError::conflict(code, format!("Unique constraint {constraint} violated"))
            }
            other => ApiError::Store(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation("body", rejection.body_text())
    }
}

/// Every path parameter in the API is a numeric id.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation("id", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Store(err) => tracing::error!("✗ Store failure: {}", err),
            ApiError::Internal(msg) => tracing::error!("✗ Internal failure: {}", msg),
            _ => {}
        }
        (self.status(), Json(self.body())).into_response()
    }
}
