use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

use super::handlers;

/// State-changing routes; wrapped with the API-key middleware in main.
pub fn register_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", post(handlers::register_update))
}

/// Read-only routes; public by design.
pub fn read_routes() -> Router<Arc<AppState>> {
    Router::new().route("/:uid", get(handlers::get_update))
}
