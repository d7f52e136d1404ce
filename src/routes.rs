//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{slug}`           - Short URL redirect
//! - `GET  /health`           - Health check: store, minting pool
//! - `POST|PUT /api/v1/create` - Create a short URL
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-client quota on mutating and API requests

use crate::api;
use crate::api::handlers::{health_handler, not_found_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};

/// Constructs the application router with all routes and middleware.
///
/// The rate limiter reads the peer address from [`axum::extract::ConnectInfo`],
/// so the router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app_router(state: AppState) -> Router {
    let limiter = state.rate_limiter.clone();

    Router::new()
        .route("/health", get(health_handler))
        .route("/{slug}", get(redirect_handler))
        .nest("/api", api::routes::api_routes())
        .fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn_with_state(limiter, rate_limit::layer))
        .layer(tracing::layer())
}
