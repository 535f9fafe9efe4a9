// libs/appointment-cell/src/services/queue.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{AppointmentError, QueueCounter};

/// Issues queue numbers per (doctor, shift_time, date). The counter row is
/// the only shared state under write contention, so every reservation goes
/// through the `reserve_queue_number` Postgres function: a single
/// `INSERT .. ON CONFLICT .. DO UPDATE SET current_queue = current_queue + 1
/// RETURNING current_queue`, serialized by row-level locking. Concurrent
/// callers therefore always observe distinct, strictly increasing values.
///
/// There is no release operation: cancelling an appointment does not hand
/// its number back.
pub struct QueueCounterService {
    supabase: Arc<SupabaseClient>,
}

impl QueueCounterService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Find-or-create the counter for the key (starting at 0), increment by
    /// one and return the new value.
    pub async fn reserve_next(
        &self,
        doctor_id: Uuid,
        shift_time_id: Uuid,
        date: &str,
        auth_token: Option<&str>,
    ) -> Result<i32, AppointmentError> {
        debug!(
            "Reserving queue number for doctor {} shift {} on {}",
            doctor_id, shift_time_id, date
        );

        let next: i32 = self
            .supabase
            .rpc(
                "reserve_queue_number",
                auth_token,
                json!({
                    "p_doctor_id": doctor_id,
                    "p_shift_time_id": shift_time_id,
                    "p_date": date,
                }),
            )
            .await?;

        Ok(next)
    }

    /// Read-only view of the counter; an absent row reads as 0. Used for
    /// diagnostics and reporting, never for assignment.
    pub async fn current_value(
        &self,
        doctor_id: Uuid,
        shift_time_id: Uuid,
        date: &str,
        auth_token: Option<&str>,
    ) -> Result<i32, AppointmentError> {
        let path = format!(
            "/rest/v1/queue_counters?doctor_id=eq.{}&shift_time_id=eq.{}&date=eq.{}&limit=1",
            doctor_id,
            shift_time_id,
            urlencoding::encode(date)
        );

        let counters: Vec<QueueCounter> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        Ok(counters.first().map(|c| c.current_queue).unwrap_or(0))
    }
}
