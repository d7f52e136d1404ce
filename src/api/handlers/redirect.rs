//! Handler for short URL redirect.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a slug to its long URL.
///
/// # Endpoint
///
/// `GET /{slug}`
///
/// # Response Codes
///
/// - **301 Moved Permanently** with `Location` set to the long URL
/// - **404 Not Found** if the path is not a well-formed slug or has no record
/// - **405 Method Not Allowed** for methods other than `GET`
pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let long_url = state.lookup_service.resolve(&slug).await?;

    // Hands the lookup buffer to the header without copying.
    let location = HeaderValue::from_maybe_shared(Bytes::from(long_url)).map_err(|_| {
        tracing::error!(%slug, "Stored URL is not a valid Location header");
        AppError::internal("Stored URL cannot be redirected to", json!({ "slug": slug }))
    })?;

    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response())
}
