use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::services::clinic::ClinicService;

#[axum::debug_handler]
pub async fn get_clinic(
    State(state): State<Arc<AppConfig>>,
    Path(clinic_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ClinicService::new(&state);
    let clinic = service.get_clinic(clinic_id, None).await?;

    Ok(Json(json!({
        "success": true,
        "data": clinic
    })))
}

#[axum::debug_handler]
pub async fn list_clinic_doctors(
    State(state): State<Arc<AppConfig>>,
    Path(clinic_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ClinicService::new(&state);

    // 404 for unknown tenants rather than an empty list
    service.get_clinic(clinic_id, None).await?;
    let doctors = service.doctors_for_clinic(clinic_id, None).await?;

    Ok(Json(json!({
        "success": true,
        "count": doctors.len(),
        "data": doctors
    })))
}
