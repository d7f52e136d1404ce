//! Per-client rate limiting middleware.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::AppError;
use crate::metrics;
use crate::security::{Admission, RateLimiter};

/// Counts mutating and `/api/` requests per client and rejects clients over
/// quota with `429 Too Many Requests`.
///
/// The client is the socket peer unless the peer is a trusted CDN edge or
/// reverse proxy, in which case the forwarded address is used. See
/// [`crate::security::TrustResolver`].
///
/// Requires the router to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/api/v1/create", post(create_handler))
///     .layer(middleware::from_fn_with_state(limiter, rate_limit::layer));
/// ```
pub async fn layer(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ConnectInfo(peer)) = req.extensions().get::<ConnectInfo<SocketAddr>>().copied()
    else {
        tracing::error!("Peer address missing, server not started with connect info");
        return Err(AppError::internal("Peer address unavailable", json!({})));
    };

    match limiter.admit(req.method(), req.uri().path(), peer.ip(), req.headers()) {
        Admission::Rejected { client, rate } => {
            metrics::record_rate_limited();
            tracing::warn!(
                client = %client.ip,
                source = ?client.source,
                rate,
                limit = limiter.limit_per_minute(),
                "Rate limit exceeded"
            );
            Err(AppError::rate_limited(
                "Too many requests",
                json!({ "limit_per_minute": limiter.limit_per_minute() }),
            ))
        }
        Admission::Allowed { .. } | Admission::Exempt => Ok(next.run(req).await),
    }
}
