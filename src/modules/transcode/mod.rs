use axum::Router;
use axum::routing::{get, patch};
use crate::state::AppState;
use axum::middleware;

pub mod dto;
pub mod handler;
pub mod model;
pub mod service;

pub fn router(state: AppState) -> axum::Router<AppState> {
    let user_routes = Router::new()
        .route("/transcodes", get(handler::list_transcodes))
        .route("/settings", get(handler::get_settings).put(handler::put_settings))
        .route_layer(middleware::from_fn(crate::middleware::auth::require_auth));

    let admin_routes = Router::new()
        .route("/transcodes/{id}/status", patch(handler::update_status))
        .route_layer(middleware::from_fn(crate::middleware::role::admin_guard));

    user_routes
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_context
        ))
}
