// libs/doctor-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// DOCTOR & SHIFT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
    pub specialty: Option<String>,
    pub status: Option<String>,
    /// Denormalized list of the doctor's active shift-time ids. The
    /// authoritative records live in `shift_times`; this list is recomputed
    /// and overwritten on every shift mutation.
    #[serde(default)]
    pub shift_time_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bookable window for one doctor on one calendar day. Rows are never
/// hard-deleted: replacing or removing a shift flips `is_active` off, and a
/// later upsert for the same (doctor, date, time_range) reactivates the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftTime {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub doctor_id: Uuid,
    /// Calendar day, "YYYY-MM-DD".
    pub date: String,
    pub shift_name: String,
    /// Display time window, e.g. "9.00am - 12.30pm".
    pub time_range: String,
    pub status: ShiftStatus,
    /// Optional booking ceiling; when the queue reaches it the shift is
    /// flipped to Unavailable (best effort).
    pub max_appointments: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftStatus {
    Available,
    Unavailable,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// One shift entry as submitted by the clinic dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftInput {
    pub date: String,
    pub time_range: String,
    pub shift_name: Option<String>,
    pub status: Option<ShiftStatus>,
    pub max_appointments: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ShiftBatchRequest {
    pub shift_times: Vec<ShiftInput>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveShiftsRequest {
    pub shift_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ShiftError {
    #[error("Invalid timeRange format at index {index}. Use format like \"9.00am - 5.00pm\"")]
    InvalidTimeRange { index: usize },

    #[error("Invalid date format at index {index}. Use YYYY-MM-DD format")]
    InvalidDate { index: usize },

    #[error("Duplicate shift found for {date} with time {time_range}")]
    DuplicateShift { date: String, time_range: String },

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] shared_database::supabase::SupabaseError),
}

impl From<ShiftError> for AppError {
    fn from(err: ShiftError) -> Self {
        use shared_database::supabase::SupabaseError;

        match err {
            ShiftError::InvalidTimeRange { .. } | ShiftError::InvalidDate { .. } => {
                AppError::ValidationError(err.to_string())
            }
            ShiftError::DuplicateShift { .. } => AppError::Conflict(err.to_string()),
            ShiftError::DoctorNotFound => AppError::NotFound(err.to_string()),
            ShiftError::Storage(SupabaseError::Unauthorized(msg)) => AppError::Auth(msg),
            ShiftError::Storage(SupabaseError::Conflict(msg)) => AppError::Conflict(msg),
            ShiftError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}
