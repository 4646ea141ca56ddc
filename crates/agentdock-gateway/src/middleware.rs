//! Bearer-token gate for `/v1/*` routes.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use crate::error::ApiError;
use crate::server::AppState;

/// Reject the request with 401 unless it carries a valid bearer token.
/// Verified [`Claims`](agentdock_platform::Claims) are stored in request extensions.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let claims = state.auth.authorize(header).inspect_err(|e| {
        tracing::debug!("Rejected {} {}: {e}", req.method(), req.uri().path());
    })?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
