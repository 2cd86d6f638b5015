//! HTTP route handlers.

pub mod health;
pub mod list;

use axum::Router;

use crate::state::AppState;

/// Router with every API route, without middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(list::router())
}
