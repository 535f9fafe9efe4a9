// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // Booking and reference tracking are patient-facing
    let public_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route(
            "/reference/{reference}",
            get(handlers::get_appointment_by_reference),
        );

    // Clinic dashboards and payment close-out require a staff token
    let protected_routes = Router::new()
        .route(
            "/doctors/{doctor_id}",
            get(handlers::get_doctor_appointments),
        )
        .route(
            "/{appointment_id}/status",
            patch(handlers::update_appointment_status),
        )
        .route(
            "/queue/{doctor_id}/{shift_time_id}/{date}",
            get(handlers::get_queue_value),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
