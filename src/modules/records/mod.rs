use axum::Router;
use axum::routing::get;
use crate::state::AppState;
use axum::middleware;

pub mod dto;
pub mod error;
pub mod handler;
pub mod model;
pub mod service;
pub mod validate;

pub fn router(state: AppState) -> axum::Router<AppState> {
    Router::new()
        .route(
            "/{collection}/records",
            get(handler::list_records).post(handler::create_record),
        )
        .route(
            "/{collection}/records/{id}",
            get(handler::view_record)
                .patch(handler::update_record)
                .delete(handler::delete_record),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_context,
        ))
}
