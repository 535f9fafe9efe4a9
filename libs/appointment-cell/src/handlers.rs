// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{BookAppointmentRequest, UpdateStatusRequest};
use crate::services::booking::AppointmentScheduler;

#[derive(Debug, Deserialize)]
pub struct DoctorAppointmentsQuery {
    pub date: Option<String>,
}

/// Patient-facing booking. No account needed; the confirmation carries the
/// queue number and reference the patient uses at the clinic.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let scheduler = AppointmentScheduler::new(&state);
    let confirmation = scheduler.create_appointment(request, None).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment booked successfully",
        "data": confirmation
    })))
}

/// Public tracking lookup by booking reference.
#[axum::debug_handler]
pub async fn get_appointment_by_reference(
    State(state): State<Arc<AppConfig>>,
    Path(reference): Path<String>,
) -> Result<Json<Value>, AppError> {
    let scheduler = AppointmentScheduler::new(&state);
    let appointment = scheduler.get_by_reference(&reference, None).await?;

    Ok(Json(json!({
        "success": true,
        "data": appointment
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<DoctorAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let scheduler = AppointmentScheduler::new(&state);
    let appointments = scheduler
        .appointments_for_doctor(doctor_id, query.date.as_deref(), Some(auth.token()))
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "data": appointments
    })))
}

/// Close out an appointment: Completed when payment is recorded, Cancelled
/// as an administrative action.
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    info!(
        "User {} updating appointment {} to {}",
        user.id, appointment_id, request.status
    );

    let scheduler = AppointmentScheduler::new(&state);
    let appointment = scheduler
        .update_status(appointment_id, request.status, Some(auth.token()))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment status updated",
        "data": appointment
    })))
}

/// Diagnostic read of the queue counter for one (doctor, shift, date) key.
/// Never mutates the counter.
#[axum::debug_handler]
pub async fn get_queue_value(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((doctor_id, shift_time_id, date)): Path<(Uuid, Uuid, String)>,
) -> Result<Json<Value>, AppError> {
    let scheduler = AppointmentScheduler::new(&state);
    let current = scheduler
        .queue()
        .current_value(doctor_id, shift_time_id, &date, Some(auth.token()))
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "doctor_id": doctor_id,
            "shift_time_id": shift_time_id,
            "date": date,
            "current_queue": current
        }
    })))
}
