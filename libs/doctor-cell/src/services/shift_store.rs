// libs/doctor-cell/src/services/shift_store.rs
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use chrono::Utc;
use regex::Regex;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{ShiftError, ShiftInput, ShiftStatus, ShiftTime};

fn time_range_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\d{1,2}\.\d{2}(am|pm)\s*-\s*\d{1,2}\.\d{2}(am|pm)$").unwrap()
    })
}

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

/// A shift entry that passed batch validation, normalized for persistence.
#[derive(Debug, Clone)]
struct ValidatedShift {
    date: String,
    shift_name: String,
    time_range: String,
    status: ShiftStatus,
    max_appointments: Option<i32>,
}

/// Owns the canonical shift-time records. All writes go through here;
/// `DoctorShiftManager` layers the doctor-list bookkeeping on top.
pub struct ShiftTimeStore {
    supabase: Arc<SupabaseClient>,
}

impl ShiftTimeStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Validate every entry before anything is written. A single bad entry
    /// fails the whole batch, naming its index.
    fn validate_batch(shifts: &[ShiftInput]) -> Result<Vec<ValidatedShift>, ShiftError> {
        shifts
            .iter()
            .enumerate()
            .map(|(index, shift)| {
                let time_range = shift.time_range.trim().to_string();
                if !time_range_pattern().is_match(&time_range) {
                    return Err(ShiftError::InvalidTimeRange { index });
                }
                if !date_pattern().is_match(&shift.date) {
                    return Err(ShiftError::InvalidDate { index });
                }

                Ok(ValidatedShift {
                    date: shift.date.clone(),
                    shift_name: shift
                        .shift_name
                        .clone()
                        .unwrap_or_else(|| format!("Shift {}", index + 1)),
                    time_range,
                    status: shift.status.unwrap_or(ShiftStatus::Available),
                    max_appointments: shift.max_appointments,
                })
            })
            .collect()
    }

    fn batch_rows(doctor_id: Uuid, clinic_id: Uuid, validated: &[ValidatedShift]) -> Vec<Value> {
        validated
            .iter()
            .map(|shift| {
                json!({
                    "clinic_id": clinic_id,
                    "doctor_id": doctor_id,
                    "date": shift.date,
                    "shift_name": shift.shift_name,
                    "time_range": shift.time_range,
                    "status": shift.status,
                    "max_appointments": shift.max_appointments,
                    "is_active": true
                })
            })
            .collect()
    }

    /// Two-phase replace for the dates in the batch: every active shift for
    /// this doctor on those dates is deactivated, then each validated entry
    /// is upserted on (doctor_id, date, time_range) — reactivating and
    /// overwriting a previously deactivated row when one exists. Runs as one
    /// transaction in the `replace_shift_batch` Postgres function, so a
    /// partial failure never leaves two active rows for the same slot and
    /// resubmitting an identical batch yields the same ids.
    pub async fn upsert_shifts(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        shifts: &[ShiftInput],
        auth_token: Option<&str>,
    ) -> Result<Vec<Uuid>, ShiftError> {
        let validated = Self::validate_batch(shifts)?;

        let dates: BTreeSet<&str> = validated.iter().map(|s| s.date.as_str()).collect();
        debug!(
            "Upserting {} shifts for doctor {} across {} dates",
            validated.len(),
            doctor_id,
            dates.len()
        );

        let shift_ids: Vec<Uuid> = self
            .supabase
            .rpc(
                "replace_shift_batch",
                auth_token,
                json!({
                    "p_doctor_id": doctor_id,
                    "p_dates": dates.iter().collect::<Vec<_>>(),
                    "p_shifts": Self::batch_rows(doctor_id, clinic_id, &validated),
                }),
            )
            .await?;

        info!(
            "Replaced shifts for doctor {}: {} rows now active",
            doctor_id,
            shift_ids.len()
        );
        Ok(shift_ids)
    }

    /// Additive variant: refuses to touch existing slots. Any new entry whose
    /// (date, time_range) collides with an active shift fails the batch.
    pub async fn add_shifts(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        shifts: &[ShiftInput],
        auth_token: Option<&str>,
    ) -> Result<Vec<Uuid>, ShiftError> {
        let validated = Self::validate_batch(shifts)?;
        if validated.is_empty() {
            return Ok(Vec::new());
        }

        let dates: BTreeSet<&str> = validated.iter().map(|s| s.date.as_str()).collect();
        let date_list = dates.into_iter().collect::<Vec<_>>().join(",");

        let path = format!(
            "/rest/v1/shift_times?doctor_id=eq.{}&date=in.({})&is_active=eq.true",
            doctor_id, date_list
        );
        let existing: Vec<ShiftTime> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        for shift in &validated {
            let duplicate = existing
                .iter()
                .any(|e| e.date == shift.date && e.time_range == shift.time_range);
            if duplicate {
                return Err(ShiftError::DuplicateShift {
                    date: shift.date.clone(),
                    time_range: shift.time_range.clone(),
                });
            }
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let created: Vec<ShiftTime> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/shift_times",
                auth_token,
                Some(Value::Array(Self::batch_rows(doctor_id, clinic_id, &validated))),
                Some(headers),
            )
            .await?;

        info!("Added {} shifts for doctor {}", created.len(), doctor_id);
        Ok(created.into_iter().map(|s| s.id).collect())
    }

    /// Soft delete. The doctor_id predicate keeps the write inside the
    /// doctor's own rows even if foreign shift ids are passed in.
    pub async fn remove_shifts(
        &self,
        doctor_id: Uuid,
        shift_ids: &[Uuid],
        auth_token: Option<&str>,
    ) -> Result<usize, ShiftError> {
        if shift_ids.is_empty() {
            return Ok(0);
        }

        let id_list = shift_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/shift_times?doctor_id=eq.{}&id=in.({})&is_active=eq.true",
            doctor_id, id_list
        );

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let deactivated: Vec<ShiftTime> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(json!({
                    "is_active": false,
                    "updated_at": Utc::now().to_rfc3339()
                })),
                Some(headers),
            )
            .await?;

        info!(
            "Deactivated {} of {} requested shifts for doctor {}",
            deactivated.len(),
            shift_ids.len(),
            doctor_id
        );
        Ok(deactivated.len())
    }

    /// Replace every shift on the dates present in the batch. Same write path
    /// as `upsert_shifts`; callers that need the doctor's full list refreshed
    /// go through `DoctorShiftManager`.
    pub async fn replace_shifts_for_dates(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        shifts: &[ShiftInput],
        auth_token: Option<&str>,
    ) -> Result<Vec<Uuid>, ShiftError> {
        self.upsert_shifts(doctor_id, clinic_id, shifts, auth_token)
            .await
    }

    pub async fn active_shifts_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<ShiftTime>, ShiftError> {
        let path = format!(
            "/rest/v1/shift_times?doctor_id=eq.{}&is_active=eq.true&order=date.asc,time_range.asc",
            doctor_id
        );
        let shifts: Vec<ShiftTime> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;
        Ok(shifts)
    }

    /// Booking-facing availability: active shifts still marked Available.
    pub async fn available_shifts_for_date(
        &self,
        doctor_id: Uuid,
        date: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<ShiftTime>, ShiftError> {
        let path = format!(
            "/rest/v1/shift_times?doctor_id=eq.{}&date=eq.{}&status=eq.Available&is_active=eq.true&order=time_range.asc",
            doctor_id,
            urlencoding::encode(date)
        );
        let shifts: Vec<ShiftTime> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;
        Ok(shifts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(date: &str, time_range: &str) -> ShiftInput {
        ShiftInput {
            date: date.to_string(),
            time_range: time_range.to_string(),
            shift_name: None,
            status: None,
            max_appointments: None,
        }
    }

    #[test]
    fn accepts_well_formed_batch() {
        let batch = vec![
            input("2024-06-01", "9.00am - 12.30pm"),
            input("2024-06-02", "1.00PM-5.00PM"),
        ];
        let validated = ShiftTimeStore::validate_batch(&batch).unwrap();

        assert_eq!(validated.len(), 2);
        assert_eq!(validated[0].shift_name, "Shift 1");
        assert_eq!(validated[1].shift_name, "Shift 2");
        assert_eq!(validated[0].status, ShiftStatus::Available);
    }

    #[test]
    fn rejects_bad_time_range_naming_index() {
        let batch = vec![
            input("2024-06-01", "9.00am - 10.00am"),
            input("2024-06-01", "bad-format"),
        ];
        let err = ShiftTimeStore::validate_batch(&batch).unwrap_err();

        assert!(matches!(err, ShiftError::InvalidTimeRange { index: 1 }));
    }

    #[test]
    fn rejects_bad_date_naming_index() {
        let batch = vec![input("06/01/2024", "9.00am - 10.00am")];
        let err = ShiftTimeStore::validate_batch(&batch).unwrap_err();

        assert!(matches!(err, ShiftError::InvalidDate { index: 0 }));
    }

    #[test]
    fn rejects_empty_time_range() {
        let batch = vec![input("2024-06-01", "   ")];
        let err = ShiftTimeStore::validate_batch(&batch).unwrap_err();

        assert!(matches!(err, ShiftError::InvalidTimeRange { index: 0 }));
    }

    #[test]
    fn trims_time_range_and_keeps_custom_name() {
        let batch = vec![ShiftInput {
            date: "2024-06-01".to_string(),
            time_range: "  9.00am - 10.00am  ".to_string(),
            shift_name: Some("Morning".to_string()),
            status: Some(ShiftStatus::Unavailable),
            max_appointments: Some(20),
        }];
        let validated = ShiftTimeStore::validate_batch(&batch).unwrap();

        assert_eq!(validated[0].time_range, "9.00am - 10.00am");
        assert_eq!(validated[0].shift_name, "Morning");
        assert_eq!(validated[0].status, ShiftStatus::Unavailable);
        assert_eq!(validated[0].max_appointments, Some(20));
    }
}
