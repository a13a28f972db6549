use axum::Router;
use axum::routing::{get, post};
use crate::state::AppState;
use axum::middleware;

pub mod dto;
pub mod error;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

/// Cookie carrying the access token for browser clients.
pub const AUTH_COOKIE: &str = "transcode_auth";

pub fn router(state: AppState) -> axum::Router<AppState> {
    let public_routes = Router::new()
        .route("/register", post(handler::register))
        .route("/login", post(handler::login))
        .route("/logout", post(handler::logout));

    let protected_routes = Router::new()
        .route("/me", get(handler::get_me))
        .route_layer(middleware::from_fn(crate::middleware::auth::require_auth))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_context
        ));

    public_routes.merge(protected_routes)
}
