use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Clinic, ClinicDoctor, ClinicError};

pub struct ClinicService {
    supabase: SupabaseClient,
}

impl ClinicService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_clinic(
        &self,
        clinic_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Clinic, ClinicError> {
        debug!("Looking up clinic {}", clinic_id);

        let path = format!("/rest/v1/clinics?id=eq.{}&limit=1", clinic_id);
        let result: Vec<Clinic> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        result.into_iter().next().ok_or(ClinicError::NotFound)
    }

    /// Tenant existence check used by the booking path.
    pub async fn clinic_exists(
        &self,
        clinic_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<bool, ClinicError> {
        match self.get_clinic(clinic_id, auth_token).await {
            Ok(clinic) => Ok(clinic.is_active),
            Err(ClinicError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn doctors_for_clinic(
        &self,
        clinic_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<ClinicDoctor>, ClinicError> {
        let path = format!(
            "/rest/v1/doctors?clinic_id=eq.{}&select=id,clinic_id,name,specialty,status&order=name.asc",
            clinic_id
        );
        let doctors: Vec<ClinicDoctor> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        Ok(doctors)
    }
}
