use std::sync::Arc;

use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::{SupabaseClient, SupabaseError};

use crate::models::Doctor;

/// Doctor lookups, keyed by id and optionally scoped to a clinic. The booking
/// and shift-management paths both resolve doctors through this service.
pub struct DoctorService {
    supabase: Arc<SupabaseClient>,
}

impl DoctorService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn get_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Option<Doctor>, SupabaseError> {
        debug!("Looking up doctor {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}&limit=1", doctor_id);
        let result: Vec<Doctor> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        Ok(result.into_iter().next())
    }

    /// Tenant-scoped lookup: a doctor outside the stated clinic reads as
    /// absent, so cross-tenant ids are never confirmed to exist.
    pub async fn get_doctor_in_clinic(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Option<Doctor>, SupabaseError> {
        let doctor = self.get_doctor(doctor_id, auth_token).await?;
        Ok(doctor.filter(|d| d.clinic_id == clinic_id))
    }
}
