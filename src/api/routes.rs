//! API route configuration.

use crate::api::handlers::create::{MAX_BODY_BYTES, create_handler};
use crate::state::AppState;
use axum::{Router, extract::DefaultBodyLimit, routing::post};

/// Versioned API routes, nested under `/api`.
///
/// # Endpoints
///
/// - `POST /v1/create` - Verify a CAPTCHA token and create a short URL
/// - `PUT  /v1/create` - Same as `POST`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/create", post(create_handler).put(create_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
