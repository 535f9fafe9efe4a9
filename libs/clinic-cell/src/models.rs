use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

/// A clinic is the tenant boundary: every doctor, shift and appointment is
/// scoped to exactly one clinic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Doctor summary as listed on a clinic page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicDoctor {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
    pub specialty: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("Clinic not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] shared_database::supabase::SupabaseError),
}

impl From<ClinicError> for AppError {
    fn from(err: ClinicError) -> Self {
        match err {
            ClinicError::NotFound => AppError::NotFound("Clinic not found".to_string()),
            ClinicError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}
