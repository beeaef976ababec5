// libs/appointment-cell/src/router.rs
use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::store::SharedAppointmentStore;

pub fn appointment_routes(store: SharedAppointmentStore) -> Router {
    Router::new()
        .route("/appointment/", post(handlers::create_appointment))
        .route(
            "/appointment/{id}",
            get(handlers::get_appointment)
                .patch(handlers::update_appointment_status)
                .delete(handlers::delete_appointment),
        )
        .route(
            "/appointments/range/",
            get(handlers::get_appointments_within_date_range),
        )
        .with_state(store)
}
