// libs/appointment-cell/src/services/store.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Appointment, AppointmentError};

/// Data-access contract for appointments. Handlers only ever talk to this
/// trait, so any backing store can be plugged in at startup.
///
/// `delete` and `update_status` report success as a plain boolean: a
/// malformed id, a missing record and a failed write all come back `false`.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Persist a new appointment and return it with its assigned id.
    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    async fn delete(&self, id: &str) -> bool;

    async fn get(&self, id: &str) -> Result<Appointment, AppointmentError>;

    /// All appointments with `start <= date <= end`, in store order.
    async fn get_within_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    async fn update_status(&self, id: &str, new_status: &str) -> bool;
}

pub type SharedAppointmentStore = Arc<dyn AppointmentStore>;
