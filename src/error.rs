//! Application error type and its HTTP rendering.
//!
//! Every handler returns `Result<_, AppError>`. Errors render as a JSON
//! envelope:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Slug not found", "details": {} } }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::store::StoreError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
    details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    RateLimited { message: String, details: Value },
    #[error("{message}")]
    VerificationFailed { message: String, details: Value },
    #[error("{message}")]
    Gateway { message: String, details: Value },
    #[error("{message}")]
    SlugSpaceExhausted { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn rate_limited(message: impl Into<String>, details: Value) -> Self {
        Self::RateLimited {
            message: message.into(),
            details,
        }
    }
    pub fn verification_failed(message: impl Into<String>, details: Value) -> Self {
        Self::VerificationFailed {
            message: message.into(),
            details,
        }
    }
    pub fn gateway(message: impl Into<String>, details: Value) -> Self {
        Self::Gateway {
            message: message.into(),
            details,
        }
    }
    pub fn slug_space_exhausted(message: impl Into<String>, details: Value) -> Self {
        Self::SlugSpaceExhausted {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status this error renders with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::VerificationFailed { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::SlugSpaceExhausted { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound { .. } => "not_found",
            AppError::RateLimited { .. } => "rate_limited",
            AppError::VerificationFailed { .. } => "verification_failed",
            AppError::Gateway { .. } => "bad_gateway",
            AppError::SlugSpaceExhausted { .. } => "slug_space_exhausted",
            AppError::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let (message, details) = match self {
            AppError::Validation { message, details }
            | AppError::NotFound { message, details }
            | AppError::RateLimited { message, details }
            | AppError::VerificationFailed { message, details }
            | AppError::Gateway { message, details }
            | AppError::SlugSpaceExhausted { message, details }
            | AppError::Internal { message, details } => (message, details),
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::not_found("Slug not found", json!({})),
            StoreError::TryAgain => {
                AppError::internal("Store is busy, try again later", json!({}))
            }
            StoreError::Io(_) | StoreError::Internal(_) => {
                AppError::internal("Store error", json!({}))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort();
        AppError::bad_request("Invalid request body", json!({ "fields": fields }))
    }
}
