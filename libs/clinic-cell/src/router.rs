use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn clinic_routes(state: Arc<AppConfig>) -> Router {
    // Clinic lookups are public reads: patients browse clinics before booking
    Router::new()
        .route("/{clinic_id}", get(handlers::get_clinic))
        .route("/{clinic_id}/doctors", get(handlers::list_clinic_doctors))
        .with_state(state)
}
