//! Handler for short URL creation.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::api::dto::create::{CreateRequest, CreateResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Largest accepted request body, in bytes.
pub const MAX_BODY_BYTES: usize = 10_000;

/// Verifies the caller's CAPTCHA token and mints a slug for the long URL.
///
/// # Endpoint
///
/// `POST /api/v1/create` or `PUT /api/v1/create`
///
/// # Request Body
///
/// ```json
/// {
///   "user_verification_token": "03AGdBq2...",
///   "long_url": "https://example.com/a/very/long/path"
/// }
/// ```
///
/// `user_captcha_response` is accepted in place of `user_verification_token`.
///
/// # Response
///
/// ```json
/// { "slug": "Xk3pQ9a", "short_url": "https://s.example.com/Xk3pQ9a" }
/// ```
///
/// Every response carries `Access-Control-Allow-Origin: *`.
///
/// # Errors
///
/// - 400 if the body is malformed, a field is empty, or verification fails
/// - 502 if the verification service cannot be reached
/// - 500 if no free slug is found or the store fails
pub async fn create_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let result = create(&state, &body).await;
    ([(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")], result).into_response()
}

async fn create(state: &AppState, body: &[u8]) -> Result<Json<CreateResponse>, AppError> {
    let request = CreateRequest::from_body(body)?;

    let link = state
        .creation_service
        .create(&request.user_verification_token, &request.long_url)
        .await?;

    Ok(Json(CreateResponse {
        slug: link.slug,
        short_url: link.short_url,
    }))
}
