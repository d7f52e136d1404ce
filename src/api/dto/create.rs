//! DTOs for the short URL creation endpoint.

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::error::AppError;

/// Body of `POST|PUT /api/v1/create`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequest {
    /// Token produced by the CAPTCHA widget on the client.
    #[serde(alias = "user_captcha_response")]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub user_verification_token: String,

    #[validate(length(min = 1, message = "must not be empty"))]
    pub long_url: String,
}

impl CreateRequest {
    /// Parses and validates a raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the body is not a JSON object with
    /// both fields present and non-empty, or if `long_url` cannot be sent
    /// back as a `Location` header.
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        let request: CreateRequest = serde_json::from_slice(body).map_err(|e| {
            AppError::bad_request("Malformed request body", json!({ "reason": e.to_string() }))
        })?;
        request.validate()?;

        if HeaderValue::from_bytes(request.long_url.as_bytes()).is_err() {
            return Err(AppError::bad_request(
                "Invalid request body",
                json!({ "fields": ["long_url"], "reason": "URL contains characters not allowed in a redirect" }),
            ));
        }

        Ok(request)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateResponse {
    pub slug: String,
    pub short_url: String,
}
