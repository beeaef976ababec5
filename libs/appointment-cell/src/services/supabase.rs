// libs/appointment-cell/src/services/supabase.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Method,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentId, AppointmentRow, NewAppointmentRow};
use crate::services::store::AppointmentStore;

const APPOINTMENTS_PATH: &str = "/rest/v1/appointments";

/// Appointment store backed by a Supabase (PostgREST) `appointments` table.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
    service_key: Option<String>,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn auth_token(&self) -> Option<&str> {
        self.service_key.as_deref()
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    fn by_id_path(id: &AppointmentId) -> String {
        format!("{}?id=eq.{}", APPOINTMENTS_PATH, id)
    }

    fn decode_row(value: Value) -> Result<Appointment, AppointmentError> {
        serde_json::from_value::<AppointmentRow>(value)
            .map(Appointment::from)
            .map_err(|e| AppointmentError::DecodeError(e.to_string()))
    }
}

fn timestamp_param(date: &DateTime<Utc>) -> String {
    urlencoding::encode(&date.to_rfc3339_opts(SecondsFormat::AutoSi, true)).into_owned()
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let payload = serde_json::to_value(NewAppointmentRow::from(&appointment))
            .map_err(|e| AppointmentError::DecodeError(e.to_string()))?;

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                APPOINTMENTS_PATH,
                self.auth_token(),
                Some(payload),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = result.into_iter().next().ok_or_else(|| {
            AppointmentError::DatabaseError("Failed to create appointment".to_string())
        })?;

        let created = Self::decode_row(row)?;
        if let Some(id) = &created.id {
            info!("Inserted a single appointment: {}", id);
        }
        Ok(created)
    }

    async fn delete(&self, id: &str) -> bool {
        let appointment_id = match id.parse::<AppointmentId>() {
            Ok(appointment_id) => appointment_id,
            Err(e) => {
                warn!("DeleteAppointment: couldn't convert appointment ID from input: {}", e);
                return false;
            }
        };

        let result: Result<Vec<Value>, _> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &Self::by_id_path(&appointment_id),
                self.auth_token(),
                None,
                Some(Self::representation_headers()),
            )
            .await;

        match result {
            Ok(rows) if !rows.is_empty() => true,
            Ok(_) => {
                debug!("DeleteAppointment: no appointment with id {}", id);
                false
            }
            Err(e) => {
                warn!("DeleteAppointment: couldn't delete appointment from db: {}", e);
                false
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Appointment, AppointmentError> {
        let appointment_id = id.parse::<AppointmentId>()?;
        debug!("Fetching appointment: {}", appointment_id);

        let result: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                &Self::by_id_path(&appointment_id),
                self.auth_token(),
                None,
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::NotFound(id.to_string()))?;

        Self::decode_row(row)
    }

    async fn get_within_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "{}?date=gte.{}&date=lte.{}",
            APPOINTMENTS_PATH,
            timestamp_param(&start),
            timestamp_param(&end)
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, self.auth_token(), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        // A single bad row must not sink the whole listing.
        let appointments = result
            .into_iter()
            .filter_map(|row| match Self::decode_row(row) {
                Ok(appointment) => Some(appointment),
                Err(e) => {
                    warn!("Skipping undecodable appointment row: {}", e);
                    None
                }
            })
            .collect();

        Ok(appointments)
    }

    async fn update_status(&self, id: &str, new_status: &str) -> bool {
        let appointment_id = match id.parse::<AppointmentId>() {
            Ok(appointment_id) => appointment_id,
            Err(e) => {
                warn!("UpdateAppointmentStatus: couldn't convert appointment ID from input: {}", e);
                return false;
            }
        };

        let result: Result<Vec<Value>, _> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &Self::by_id_path(&appointment_id),
                self.auth_token(),
                Some(json!({ "status": new_status })),
                Some(Self::representation_headers()),
            )
            .await;

        match result {
            Ok(rows) if !rows.is_empty() => true,
            Ok(_) => {
                debug!("UpdateAppointmentStatus: no appointment with id {}", id);
                false
            }
            Err(e) => {
                warn!("UpdateAppointmentStatus: unable to update status: {}", e);
                false
            }
        }
    }
}
