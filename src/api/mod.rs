//! REST API layer: route handlers, request extractors, DTOs, middleware
//! and router composition.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;

use axum::Router;

use crate::app_state::AppState;

/// Builds the router with every REST endpoint, without middleware.
pub fn build_router() -> Router<AppState> {
    handlers::routes()
}

/// Builds the complete application: routes, middleware stack and state.
pub fn build_app(state: AppState) -> Router {
    middleware::apply(build_router()).with_state(state)
}
