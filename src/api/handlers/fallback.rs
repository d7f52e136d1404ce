//! Catch-all for unknown routes.

use serde_json::json;

use crate::error::AppError;

pub async fn not_found_handler() -> AppError {
    AppError::not_found("Not found", json!({}))
}
