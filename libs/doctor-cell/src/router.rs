// libs/doctor-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    // Patients browse availability without an account
    let public_routes = Router::new().route(
        "/{doctor_id}/availability",
        get(handlers::get_doctor_availability),
    );

    // Shift management is clinic-staff only
    let protected_routes = Router::new()
        .route("/{doctor_id}/shifts", post(handlers::add_shifts))
        .route("/{doctor_id}/shifts", put(handlers::upsert_shifts))
        .route("/{doctor_id}/shifts", delete(handlers::remove_shifts))
        .route("/{doctor_id}/shifts", get(handlers::get_doctor_shifts))
        .route("/{doctor_id}/shifts/replace", put(handlers::replace_shifts))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
