// libs/appointment-cell/src/handlers.rs
use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{StatusCode, Uri},
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use shared_models::error::{json_text_response, AppError};

use crate::models::{
    parse_timestamp, validate_date_range, Appointment, AppointmentDraft, StatusUpdate,
};
use crate::services::store::SharedAppointmentStore;

const INVALID_APPOINTMENT: &str = "appointment must have valid name, description and date values";

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

/// Create an appointment. Status is always set to `open`.
#[axum::debug_handler]
pub async fn create_appointment(
    State(store): State<SharedAppointmentStore>,
    body: Bytes,
) -> Result<Json<Appointment>, AppError> {
    let draft = AppointmentDraft::from_json_lenient(&body);

    let appointment = draft
        .into_open_appointment()
        .map_err(|_| AppError::BadRequest(INVALID_APPOINTMENT.to_string()))?;

    let created = store.create(appointment).await.map_err(|e| {
        error!("CreateAppointment: store failure: {}", e);
        AppError::Database(e.to_string())
    })?;

    Ok(Json(created))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(store): State<SharedAppointmentStore>,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let id = path_id(path, &uri);
    if !store.delete(&id).await {
        return Err(AppError::BadRequest(format!(
            "unable to find resource with id {}",
            id
        )));
    }

    Ok(json_text_response(
        StatusCode::OK,
        format!("appointment {} successfully deleted", id),
    ))
}

/// Replace the status of an appointment. A missing or malformed body is an
/// empty status, not an error.
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(store): State<SharedAppointmentStore>,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Result<Response, AppError> {
    let id = path_id(path, &uri);
    let update = StatusUpdate::from_json_lenient(&body);

    if !store.update_status(&id, &update.status).await {
        return Err(AppError::BadRequest(format!(
            "unable to update appointment status at id {}",
            id
        )));
    }

    Ok(json_text_response(
        StatusCode::OK,
        format!("appointment status successfully updated to {}", update),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(store): State<SharedAppointmentStore>,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Appointment>, AppError> {
    let id = path_id(path, &uri);
    let appointment = store.get(&id).await.map_err(|e| {
        debug!("GetAppointment: {}", e);
        AppError::BadRequest(format!("Unable to retrieve appointment with ID {}", id))
    })?;

    Ok(Json(appointment))
}

/// List appointments whose date lies in `[start, end]`, both taken from the
/// query string.
#[axum::debug_handler]
pub async fn get_appointments_within_date_range(
    State(store): State<SharedAppointmentStore>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let params = match query {
        Ok(Query(params)) => params,
        Err(e) => {
            warn!("error parsing query string: {}", e);
            Vec::new()
        }
    };

    let (start, end) = validate_date_range(
        query_timestamp(&params, "start"),
        query_timestamp(&params, "end"),
    )
    .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let appointments = store.get_within_date_range(start, end).await.map_err(|e| {
        error!("GetAppointmentsWithinDateRange: store failure: {}", e);
        AppError::Database(e.to_string())
    })?;

    Ok(Json(appointments))
}

// ==============================================================================
// HELPERS
// ==============================================================================

// An id that does not percent-decode to UTF-8 is decoded lossily from the
// raw segment and handed to the store, which rejects it like any unknown id.
fn path_id(path: Result<Path<String>, PathRejection>, uri: &Uri) -> String {
    match path {
        Ok(Path(id)) => id,
        Err(e) => {
            warn!("error decoding appointment id: {}", e);
            let segment = uri.path().rsplit('/').next().unwrap_or_default();
            String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes())).into_owned()
        }
    }
}

// Form decoding turns `+` into a space, which would break offsets such as
// `+02:00`; put it back before parsing.
fn query_timestamp(params: &[(String, String)], key: &str) -> Option<DateTime<Utc>> {
    let values: Vec<&str> = params
        .iter()
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
        .collect();

    if values.is_empty() {
        return None;
    }

    let raw = values.concat().replace(' ', "+");
    let parsed = parse_timestamp(&raw);
    if parsed.is_none() {
        warn!("error parsing time for {}: {}", key, raw);
    }
    parsed
}
