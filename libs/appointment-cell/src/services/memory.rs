// libs/appointment-cell/src/services/memory.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{Appointment, AppointmentError, AppointmentId};
use crate::services::store::AppointmentStore;

/// Process-local store, used for development and tests.
pub struct InMemoryAppointmentStore {
    appointments: Arc<RwLock<HashMap<AppointmentId, Appointment>>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self {
            appointments: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.appointments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.appointments.read().await.is_empty()
    }
}

impl Default for InMemoryAppointmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let id = AppointmentId::new();
        let created = Appointment {
            id: Some(id),
            ..appointment
        };

        self.appointments.write().await.insert(id, created.clone());
        info!("Inserted a single appointment: {}", id);

        Ok(created)
    }

    async fn delete(&self, id: &str) -> bool {
        let Ok(appointment_id) = id.parse::<AppointmentId>() else {
            debug!("DeleteAppointment: couldn't convert appointment ID from input: {}", id);
            return false;
        };

        let removed = self.appointments.write().await.remove(&appointment_id);
        if removed.is_none() {
            debug!("DeleteAppointment: no appointment with id {}", id);
        }
        removed.is_some()
    }

    async fn get(&self, id: &str) -> Result<Appointment, AppointmentError> {
        let appointment_id = id.parse::<AppointmentId>()?;

        self.appointments
            .read()
            .await
            .get(&appointment_id)
            .cloned()
            .ok_or_else(|| AppointmentError::NotFound(id.to_string()))
    }

    async fn get_within_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut matching: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|appointment| appointment.date >= start && appointment.date <= end)
            .cloned()
            .collect();

        matching.sort_by_key(|appointment| appointment.date);
        Ok(matching)
    }

    async fn update_status(&self, id: &str, new_status: &str) -> bool {
        let Ok(appointment_id) = id.parse::<AppointmentId>() else {
            debug!("UpdateAppointmentStatus: couldn't convert appointment ID from input: {}", id);
            return false;
        };

        match self.appointments.write().await.get_mut(&appointment_id) {
            Some(appointment) => {
                appointment.status = new_status.to_string();
                true
            }
            None => {
                debug!("UpdateAppointmentStatus: no appointment with id {}", id);
                false
            }
        }
    }
}
