// libs/doctor-cell/src/services/shift_manager.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Doctor, ShiftError, ShiftInput, ShiftTime};
use crate::services::doctor::DoctorService;
use crate::services::shift_store::ShiftTimeStore;

/// Front door for every shift mutation. Wraps `ShiftTimeStore` and keeps the
/// doctor's denormalized `shift_time_ids` list consistent with the canonical
/// records: the list is recomputed and overwritten after each write, never
/// patched incrementally.
pub struct DoctorShiftManager {
    supabase: Arc<SupabaseClient>,
    store: ShiftTimeStore,
    doctors: DoctorService,
}

impl DoctorShiftManager {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            store: ShiftTimeStore::new(Arc::clone(&supabase)),
            doctors: DoctorService::new(Arc::clone(&supabase)),
            supabase,
        }
    }

    pub fn store(&self) -> &ShiftTimeStore {
        &self.store
    }

    pub fn doctors(&self) -> &DoctorService {
        &self.doctors
    }

    async fn require_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Doctor, ShiftError> {
        self.doctors
            .get_doctor(doctor_id, auth_token)
            .await?
            .ok_or(ShiftError::DoctorNotFound)
    }

    pub async fn upsert_shifts(
        &self,
        doctor_id: Uuid,
        shifts: &[ShiftInput],
        auth_token: Option<&str>,
    ) -> Result<Vec<Uuid>, ShiftError> {
        let doctor = self.require_doctor(doctor_id, auth_token).await?;

        let shift_ids = self
            .store
            .upsert_shifts(doctor_id, doctor.clinic_id, shifts, auth_token)
            .await?;
        self.sync_shift_list(doctor_id, auth_token).await?;

        Ok(shift_ids)
    }

    pub async fn add_shifts(
        &self,
        doctor_id: Uuid,
        shifts: &[ShiftInput],
        auth_token: Option<&str>,
    ) -> Result<Vec<Uuid>, ShiftError> {
        let doctor = self.require_doctor(doctor_id, auth_token).await?;

        let shift_ids = self
            .store
            .add_shifts(doctor_id, doctor.clinic_id, shifts, auth_token)
            .await?;
        self.sync_shift_list(doctor_id, auth_token).await?;

        Ok(shift_ids)
    }

    pub async fn replace_shifts_for_dates(
        &self,
        doctor_id: Uuid,
        shifts: &[ShiftInput],
        auth_token: Option<&str>,
    ) -> Result<Vec<Uuid>, ShiftError> {
        let doctor = self.require_doctor(doctor_id, auth_token).await?;

        let shift_ids = self
            .store
            .replace_shifts_for_dates(doctor_id, doctor.clinic_id, shifts, auth_token)
            .await?;
        self.sync_shift_list(doctor_id, auth_token).await?;

        Ok(shift_ids)
    }

    /// Soft-deletes the named shifts and filters them out of the doctor's
    /// list. Returns how many rows were actually deactivated.
    pub async fn remove_shifts(
        &self,
        doctor_id: Uuid,
        shift_ids: &[Uuid],
        auth_token: Option<&str>,
    ) -> Result<usize, ShiftError> {
        let doctor = self.require_doctor(doctor_id, auth_token).await?;

        let removed = self
            .store
            .remove_shifts(doctor_id, shift_ids, auth_token)
            .await?;

        let remaining: Vec<Uuid> = doctor
            .shift_time_ids
            .iter()
            .filter(|id| !shift_ids.contains(id))
            .copied()
            .collect();
        self.write_shift_list(doctor_id, remaining, auth_token)
            .await?;

        Ok(removed)
    }

    pub async fn active_shifts(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<ShiftTime>, ShiftError> {
        self.require_doctor(doctor_id, auth_token).await?;
        self.store
            .active_shifts_for_doctor(doctor_id, auth_token)
            .await
    }

    /// Recompute the doctor's list as exactly the currently-active shift ids.
    async fn sync_shift_list(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<(), ShiftError> {
        let active = self
            .store
            .active_shifts_for_doctor(doctor_id, auth_token)
            .await?;

        let mut shift_ids: Vec<Uuid> = Vec::with_capacity(active.len());
        for shift in active {
            if !shift_ids.contains(&shift.id) {
                shift_ids.push(shift.id);
            }
        }

        self.write_shift_list(doctor_id, shift_ids, auth_token).await
    }

    async fn write_shift_list(
        &self,
        doctor_id: Uuid,
        shift_ids: Vec<Uuid>,
        auth_token: Option<&str>,
    ) -> Result<(), ShiftError> {
        debug!(
            "Writing shift list for doctor {}: {} entries",
            doctor_id,
            shift_ids.len()
        );

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(json!({
                    "shift_time_ids": shift_ids,
                    "updated_at": Utc::now().to_rfc3339()
                })),
                Some(headers),
            )
            .await?;

        info!("Shift list updated for doctor {}", doctor_id);
        Ok(())
    }
}
