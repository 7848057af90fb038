//! Route definitions for the Kenosis API.

pub mod health;
pub mod people;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::AppState;

/// Request bodies larger than this are rejected outright.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the full application router. Shared with integration tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/api/people", post(people::create).get(people::list))
        .route("/api/people/{id}", get(people::get_by_id))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
