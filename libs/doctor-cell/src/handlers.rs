// libs/doctor-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AvailabilityQuery, RemoveShiftsRequest, ShiftBatchRequest, ShiftError};
use crate::services::shift_manager::DoctorShiftManager;

#[axum::debug_handler]
pub async fn add_shifts(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<ShiftBatchRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User {} adding shifts for doctor {}", user.id, doctor_id);

    let manager = DoctorShiftManager::new(&state);
    let shift_ids = manager
        .add_shifts(doctor_id, &request.shift_times, Some(auth.token()))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Shifts added successfully",
        "data": { "shift_ids": shift_ids }
    })))
}

#[axum::debug_handler]
pub async fn upsert_shifts(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<ShiftBatchRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User {} upserting shifts for doctor {}", user.id, doctor_id);

    let manager = DoctorShiftManager::new(&state);
    let shift_ids = manager
        .upsert_shifts(doctor_id, &request.shift_times, Some(auth.token()))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Shifts updated successfully",
        "data": { "shift_ids": shift_ids }
    })))
}

#[axum::debug_handler]
pub async fn replace_shifts(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<ShiftBatchRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User {} replacing shifts for doctor {}", user.id, doctor_id);

    let manager = DoctorShiftManager::new(&state);
    let shift_ids = manager
        .replace_shifts_for_dates(doctor_id, &request.shift_times, Some(auth.token()))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Shifts replaced successfully",
        "data": { "shift_ids": shift_ids }
    })))
}

#[axum::debug_handler]
pub async fn remove_shifts(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<RemoveShiftsRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User {} removing shifts for doctor {}", user.id, doctor_id);

    let manager = DoctorShiftManager::new(&state);
    let removed_count = manager
        .remove_shifts(doctor_id, &request.shift_ids, Some(auth.token()))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Shifts removed successfully",
        "data": { "removed_count": removed_count }
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_shifts(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let manager = DoctorShiftManager::new(&state);
    let shifts = manager.active_shifts(doctor_id, Some(auth.token())).await?;

    Ok(Json(json!({
        "success": true,
        "count": shifts.len(),
        "data": shifts
    })))
}

/// Public availability lookup: the shifts a patient can still book for one
/// doctor on one date.
#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let manager = DoctorShiftManager::new(&state);

    let doctor = manager
        .doctors()
        .get_doctor(doctor_id, None)
        .await
        .map_err(ShiftError::Storage)?
        .ok_or(ShiftError::DoctorNotFound)?;

    let shifts = manager
        .store()
        .available_shifts_for_date(doctor_id, &query.date, None)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "doctor_id": doctor.id,
            "doctor_name": doctor.name,
            "doctor_status": doctor.status,
            "date": query.date,
            "shifts": shifts.iter().map(|s| json!({
                "id": s.id,
                "shift_name": s.shift_name,
                "time_range": s.time_range,
                "status": s.status
            })).collect::<Vec<_>>()
        }
    })))
}
