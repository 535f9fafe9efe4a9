// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub doctor_id: Uuid,
    pub shift_time_id: Uuid,
    pub patient_name: String,
    pub patient_gender: PatientGender,
    pub patient_age: i32,
    pub patient_contact: String,
    /// Calendar day, "YYYY-MM-DD".
    pub appointment_date: String,
    pub appointment_time: String,
    /// Position in the doctor's queue for (doctor, shift, date). Immutable
    /// after creation.
    pub queue_number: i32,
    /// Globally unique booking reference handed to the patient. Immutable
    /// after creation.
    pub reference_number: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientGender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Pending,
    Confirm,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Pending -> Confirm -> Completed | Cancelled. Completed and Cancelled
    /// are terminal.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirm) | (Confirm, Completed) | (Confirm, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "Pending"),
            AppointmentStatus::Confirm => write!(f, "Confirm"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Counter row backing queue-number assignment, unique per
/// (doctor, shift_time, date). `current_queue` only ever moves up;
/// cancellations do not return ticket numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueCounter {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub shift_time_id: Uuid,
    pub date: String,
    pub current_queue: i32,
    pub last_reset: Option<DateTime<Utc>>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    /// When present, the doctor must belong to this clinic.
    pub clinic_id: Option<Uuid>,
    pub doctor_id: Uuid,
    pub shift_time_id: Uuid,
    pub patient_name: String,
    pub patient_gender: PatientGender,
    pub patient_age: i32,
    pub patient_contact: String,
    pub appointment_date: String,
    pub appointment_time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub appointment_id: Uuid,
    pub queue_number: i32,
    pub reference_number: String,
    pub status: AppointmentStatus,
    pub doctor_name: String,
    pub appointment_date: String,
    pub appointment_time: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor does not belong to the stated clinic")]
    DoctorNotInClinic,

    #[error("Shift time not found")]
    ShiftTimeNotFound,

    #[error("Selected time slot is not available")]
    SlotUnavailable,

    #[error("Appointment not found")]
    NotFound,

    #[error("Booking conflict: {0}")]
    Conflict(String),

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] shared_database::supabase::SupabaseError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        use shared_database::supabase::SupabaseError;

        match err {
            AppointmentError::DoctorNotFound
            | AppointmentError::DoctorNotInClinic
            | AppointmentError::ShiftTimeNotFound
            | AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::SlotUnavailable => AppError::BadRequest(err.to_string()),
            AppointmentError::Conflict(msg) => AppError::Conflict(msg),
            AppointmentError::InvalidStatusTransition { .. } => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::Storage(SupabaseError::Unauthorized(msg)) => AppError::Auth(msg),
            AppointmentError::Storage(SupabaseError::Conflict(msg)) => AppError::Conflict(msg),
            AppointmentError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_confirms_then_closes() {
        use AppointmentStatus::*;

        assert!(Pending.can_transition_to(Confirm));
        assert!(Confirm.can_transition_to(Completed));
        assert!(Confirm.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        use AppointmentStatus::*;

        for next in [Pending, Confirm, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Confirm.is_terminal());
    }

    #[test]
    fn no_skipping_confirmation() {
        use AppointmentStatus::*;

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Cancelled));
        assert!(!Confirm.can_transition_to(Pending));
    }

    #[test]
    fn status_serializes_as_original_labels() {
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Confirm).unwrap(),
            "\"Confirm\""
        );
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Cancelled).unwrap(),
            "\"Cancelled\""
        );
    }
}
