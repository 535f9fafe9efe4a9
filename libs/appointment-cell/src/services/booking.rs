// libs/appointment-cell/src/services/booking.rs
use std::sync::{Arc, OnceLock};

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::models::{ShiftStatus, ShiftTime};
use doctor_cell::services::doctor::DoctorService;
use shared_config::AppConfig;
use shared_database::supabase::{SupabaseClient, SupabaseError};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, BookingConfirmation,
};
use crate::services::queue::QueueCounterService;

const MAX_REFERENCE_ATTEMPTS: u32 = 3;

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

/// Booking reference shown to the patient: millisecond timestamp plus a
/// random suffix. Global uniqueness is still enforced by the storage layer;
/// this only makes collisions astronomically unlikely.
fn generate_reference_number() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("REF-{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// The only path by which appointments come into existence. Validates doctor
/// and slot, reserves the next queue number and persists the appointment in
/// one storage-side transaction, then applies the best-effort capacity cap.
pub struct AppointmentScheduler {
    supabase: Arc<SupabaseClient>,
    doctors: DoctorService,
    queue: QueueCounterService,
}

impl AppointmentScheduler {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            doctors: DoctorService::new(Arc::clone(&supabase)),
            queue: QueueCounterService::new(Arc::clone(&supabase)),
            supabase,
        }
    }

    pub fn queue(&self) -> &QueueCounterService {
        &self.queue
    }

    pub async fn create_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: Option<&str>,
    ) -> Result<BookingConfirmation, AppointmentError> {
        info!(
            "Booking appointment for doctor {} shift {} on {}",
            request.doctor_id, request.shift_time_id, request.appointment_date
        );

        Self::validate_request(&request)?;

        // Step 1: doctor must exist, inside the stated clinic when given
        let doctor = self
            .doctors
            .get_doctor(request.doctor_id, auth_token)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        if let Some(clinic_id) = request.clinic_id {
            if doctor.clinic_id != clinic_id {
                return Err(AppointmentError::DoctorNotInClinic);
            }
        }

        // Step 2: shift must exist, be active and still Available. Failing
        // here never creates or increments a counter row.
        let shift = self
            .get_shift_time(request.shift_time_id, auth_token)
            .await?
            .ok_or(AppointmentError::ShiftTimeNotFound)?;

        if !shift.is_active || shift.status != ShiftStatus::Available {
            return Err(AppointmentError::SlotUnavailable);
        }

        // Steps 3-5: reserve + insert run inside the book_appointment_slot
        // transaction. A 409 means the generated reference collided with an
        // existing row; regenerate and retry.
        let mut last_conflict = String::new();
        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let reference_number = generate_reference_number();

            match self
                .book_slot(&doctor.clinic_id, &request, &reference_number, auth_token)
                .await
            {
                Ok(appointment) => {
                    info!(
                        "Appointment {} confirmed: queue number {} reference {}",
                        appointment.id, appointment.queue_number, appointment.reference_number
                    );

                    // Step 6: best-effort capacity cap. The counter stays the
                    // source of truth; a burst at the boundary may overshoot.
                    if let Some(max) = shift.max_appointments {
                        if appointment.queue_number >= max {
                            self.mark_shift_unavailable(shift.id, auth_token).await;
                        }
                    }

                    return Ok(BookingConfirmation {
                        appointment_id: appointment.id,
                        queue_number: appointment.queue_number,
                        reference_number: appointment.reference_number,
                        status: appointment.status,
                        doctor_name: doctor.name.clone(),
                        appointment_date: appointment.appointment_date,
                        appointment_time: appointment.appointment_time,
                    });
                }
                Err(AppointmentError::Storage(SupabaseError::Conflict(msg))) => {
                    warn!(
                        "Reference number collision on attempt {}/{}, regenerating",
                        attempt, MAX_REFERENCE_ATTEMPTS
                    );
                    last_conflict = msg;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppointmentError::Conflict(last_conflict))
    }

    /// One call, one transaction: the function re-checks the shift row,
    /// upsert-increments the queue counter and inserts the appointment with
    /// status Confirm. Any failure rolls all of it back, so a failed booking
    /// never leaks a counter increment or a partial appointment.
    async fn book_slot(
        &self,
        clinic_id: &Uuid,
        request: &BookAppointmentRequest,
        reference_number: &str,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment: Appointment = self
            .supabase
            .rpc(
                "book_appointment_slot",
                auth_token,
                json!({
                    "p_clinic_id": clinic_id,
                    "p_doctor_id": request.doctor_id,
                    "p_shift_time_id": request.shift_time_id,
                    "p_patient_name": request.patient_name,
                    "p_patient_gender": request.patient_gender,
                    "p_patient_age": request.patient_age,
                    "p_patient_contact": request.patient_contact,
                    "p_appointment_date": request.appointment_date,
                    "p_appointment_time": request.appointment_time,
                    "p_reference_number": reference_number,
                }),
            )
            .await?;

        Ok(appointment)
    }

    fn validate_request(request: &BookAppointmentRequest) -> Result<(), AppointmentError> {
        if request.patient_name.trim().is_empty() {
            return Err(AppointmentError::Validation(
                "Patient name is required".to_string(),
            ));
        }
        if request.patient_contact.trim().is_empty() {
            return Err(AppointmentError::Validation(
                "Patient contact is required".to_string(),
            ));
        }
        if !(0..=130).contains(&request.patient_age) {
            return Err(AppointmentError::Validation(
                "Patient age is out of range".to_string(),
            ));
        }
        if !date_pattern().is_match(&request.appointment_date) {
            return Err(AppointmentError::Validation(
                "Appointment date must use YYYY-MM-DD format".to_string(),
            ));
        }
        if request.appointment_time.trim().is_empty() {
            return Err(AppointmentError::Validation(
                "Appointment time is required".to_string(),
            ));
        }
        Ok(())
    }

    async fn get_shift_time(
        &self,
        shift_time_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Option<ShiftTime>, AppointmentError> {
        let path = format!("/rest/v1/shift_times?id=eq.{}&limit=1", shift_time_id);
        let shifts: Vec<ShiftTime> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;
        Ok(shifts.into_iter().next())
    }

    /// Capacity flip is outside the booking transaction on purpose: losing
    /// it only means one extra rejection round-trip at step 2.
    async fn mark_shift_unavailable(&self, shift_time_id: Uuid, auth_token: Option<&str>) {
        let path = format!("/rest/v1/shift_times?id=eq.{}", shift_time_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Result<Vec<Value>, _> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(json!({
                    "status": "Unavailable",
                    "updated_at": Utc::now().to_rfc3339()
                })),
                Some(headers),
            )
            .await;

        match result {
            Ok(_) => debug!("Shift {} reached capacity, marked Unavailable", shift_time_id),
            Err(e) => warn!(
                "Could not mark shift {} unavailable after reaching capacity: {}",
                shift_time_id, e
            ),
        }
    }

    pub async fn get_by_reference(
        &self,
        reference_number: &str,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?reference_number=eq.{}&limit=1",
            urlencoding::encode(reference_number)
        );
        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        appointments
            .into_iter()
            .next()
            .ok_or(AppointmentError::NotFound)
    }

    /// Status transitions after creation: Completed when a payment is
    /// recorded, Cancelled by clinic staff. Terminal states are frozen.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&limit=1", appointment_id);
        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;
        let appointment = appointments
            .into_iter()
            .next()
            .ok_or(AppointmentError::NotFound)?;

        if !appointment.status.can_transition_to(new_status) {
            return Err(AppointmentError::InvalidStatusTransition {
                from: appointment.status,
                to: new_status,
            });
        }

        let update_path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let updated: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                auth_token,
                Some(json!({
                    "status": new_status,
                    "updated_at": Utc::now().to_rfc3339()
                })),
                Some(headers),
            )
            .await?;

        updated
            .into_iter()
            .next()
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
        date: Option<&str>,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=appointment_date.asc,queue_number.asc",
            doctor_id
        );
        if let Some(date) = date {
            path.push_str(&format!("&appointment_date=eq.{}", urlencoding::encode(date)));
        }

        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;
        Ok(appointments)
    }
}
