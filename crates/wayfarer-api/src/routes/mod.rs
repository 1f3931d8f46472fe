//! HTTP routes.

use axum::Router;

use crate::state::AppState;

pub mod campaigns;
pub mod health;

/// Assembles every route under its prefix. Middleware layers are added by
/// the caller.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/campaigns", campaigns::router())
        .with_state(state)
}
