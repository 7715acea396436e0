use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::AppState;

/// Middleware to validate the API key on state-changing routes.
///
/// If `API_KEY` is configured, requests must include a matching `X-API-Key`
/// header. If not set, all requests are allowed (open mode). This gates the
/// HTTP surface only; request authenticity is the signature gate's job.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_key) = &state.config.api_key else {
        return Ok(next.run(request).await);
    };

    let provided_key = request
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());

    match provided_key {
        Some(key) if key == expected_key => Ok(next.run(request).await),
        Some(_) => {
            warn!("Invalid API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            warn!("Missing X-API-Key header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
