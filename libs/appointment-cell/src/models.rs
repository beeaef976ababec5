// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

// ==============================================================================
// STATUS VALUES
// ==============================================================================

// Status is an open set of strings; these are the values the service itself writes.
pub const STATUS_OPEN: &str = "open";
pub const STATUS_CLOSED: &str = "closed";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// Store-assigned identifier. Serializes as the hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(Uuid);

impl AppointmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AppointmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AppointmentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for AppointmentId {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| AppointmentError::InvalidId(s.to_string()))
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AppointmentId>,
    pub name: String,
    pub description: String,
    pub status: String,
    pub date: DateTime<Utc>,
}

/// Body of a create request, decoded leniently. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentDraft {
    pub name: String,
    pub description: String,
    pub status: String,
    pub date: Option<DateTime<Utc>>,
}

impl AppointmentDraft {
    /// Decode a request body without failing. Malformed JSON, mistyped fields
    /// and unparseable dates are logged and leave the field at its zero value.
    /// Keys are matched case-insensitively.
    pub fn from_json_lenient(body: &[u8]) -> Self {
        let object = decode_object(body, "appointment");

        Self {
            name: string_field(&object, "name"),
            description: string_field(&object, "description"),
            status: string_field(&object, "status"),
            date: date_field(&object, "date"),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.description.is_empty() && self.date.is_some()
    }

    /// Validate the draft and turn it into a new, `open` appointment.
    /// Any client supplied status is discarded.
    pub fn into_open_appointment(self) -> Result<Appointment, AppointmentError> {
        let date = match self.date {
            Some(date) if self.is_valid() => date,
            _ => return Err(AppointmentError::InvalidAppointment),
        };

        Ok(Appointment {
            id: None,
            name: self.name,
            description: self.description,
            status: STATUS_OPEN.to_string(),
            date,
        })
    }
}

// ==============================================================================
// STATUS UPDATE
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: String,
}

impl StatusUpdate {
    pub fn from_json_lenient(body: &[u8]) -> Self {
        let object = decode_object(body, "status update");
        Self {
            status: string_field(&object, "status"),
        }
    }
}

// Rendered as `{closed}` in the update confirmation message.
impl fmt::Display for StatusUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.status)
    }
}

// ==============================================================================
// PERSISTENCE FORMAT
// ==============================================================================

/// A row of the `appointments` table as returned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentRow {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    pub date: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: Some(AppointmentId::from(row.id)),
            name: row.name,
            description: row.description,
            status: row.status,
            date: row.date,
        }
    }
}

/// Insert payload; the store assigns `id`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAppointmentRow<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub status: &'a str,
    pub date: DateTime<Utc>,
}

impl<'a> From<&'a Appointment> for NewAppointmentRow<'a> {
    fn from(appointment: &'a Appointment) -> Self {
        Self {
            name: &appointment.name,
            description: &appointment.description,
            status: &appointment.status,
            date: appointment.date,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("invalid appointment id: {0}")]
    InvalidId(String),

    #[error("appointment {0} not found")]
    NotFound(String),

    #[error("appointment must have valid name, description and date values")]
    InvalidAppointment,

    #[error("request must have valid start and end date range")]
    InvalidDateRange,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("failed to decode appointment: {0}")]
    DecodeError(String),
}

// ==============================================================================
// DATE RANGE
// ==============================================================================

/// Both bounds must be present and `end` must not precede `start`.
pub fn validate_date_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AppointmentError> {
    match (start, end) {
        (Some(start), Some(end)) if end >= start => Ok((start, end)),
        _ => Err(AppointmentError::InvalidDateRange),
    }
}

// ==============================================================================
// LENIENT DECODING HELPERS
// ==============================================================================

/// Parse a strict RFC 3339 timestamp. The zero instant
/// (`0001-01-01T00:00:00Z`) counts as absent.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let date = DateTime::parse_from_rfc3339(value.trim())
        .ok()?
        .with_timezone(&Utc);

    if is_zero_time(&date) {
        None
    } else {
        Some(date)
    }
}

fn is_zero_time(date: &DateTime<Utc>) -> bool {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|zero| date.naive_utc() == zero)
        .unwrap_or(false)
}

fn decode_object(body: &[u8], what: &str) -> Map<String, Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        debug!("empty {} body", what);
        return Map::new();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            warn!("error decoding {} json: expected an object, got {}", what, other);
            Map::new()
        }
        Err(e) => {
            warn!("error decoding {} json: {}", what, e);
            Map::new()
        }
    }
}

fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn string_field(object: &Map<String, Value>, name: &str) -> String {
    match field(object, name) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(value)) => value.clone(),
        Some(other) => {
            warn!("error decoding field '{}': expected a string, got {}", name, other);
            String::new()
        }
    }
}

fn date_field(object: &Map<String, Value>, name: &str) -> Option<DateTime<Utc>> {
    let raw = string_field(object, name);
    if raw.is_empty() {
        return None;
    }

    let date = parse_timestamp(&raw);
    if date.is_none() {
        warn!("error decoding field '{}': '{}' is not an RFC 3339 timestamp", name, raw);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_date_range() {
        let start = parse_timestamp("2019-07-29T09:00:01Z");
        let end = parse_timestamp("2019-08-29T09:00:01Z");

        assert!(validate_date_range(start, end).is_ok());
        assert!(validate_date_range(start, start).is_ok());
        assert!(matches!(
            validate_date_range(end, start),
            Err(AppointmentError::InvalidDateRange)
        ));
        assert!(matches!(
            validate_date_range(start, None),
            Err(AppointmentError::InvalidDateRange)
        ));
    }

    #[test]
    fn test_draft_accepts_capitalised_keys() {
        let body = json!({
            "Name": "Ultimate Car Appointment",
            "Description": "even newer engine appointment",
            "Status": "closed",
            "Date": "2019-08-28T09:00:01+00:00"
        })
        .to_string();

        let draft = AppointmentDraft::from_json_lenient(body.as_bytes());
        assert_eq!(draft.name, "Ultimate Car Appointment");
        assert_eq!(draft.status, "closed");
        assert!(draft.is_valid());

        let appointment = draft.into_open_appointment().unwrap();
        assert_eq!(appointment.status, STATUS_OPEN);
        assert_eq!(appointment.id, None);
    }

    #[test]
    fn test_draft_keeps_good_fields_when_others_are_bad() {
        let body = br#"{"name": "Brakes", "description": 42, "date": "next tuesday"}"#;
        let draft = AppointmentDraft::from_json_lenient(body);

        assert_eq!(draft.name, "Brakes");
        assert_eq!(draft.description, "");
        assert_eq!(draft.date, None);
        assert!(!draft.is_valid());
    }

    #[test]
    fn test_draft_from_garbage_is_empty() {
        assert_eq!(AppointmentDraft::from_json_lenient(b"{not json"), AppointmentDraft::default());
        assert_eq!(AppointmentDraft::from_json_lenient(b""), AppointmentDraft::default());
        assert_eq!(AppointmentDraft::from_json_lenient(b"[1,2]"), AppointmentDraft::default());
    }

    #[test]
    fn test_zero_date_is_rejected() {
        let body = br#"{"name": "a", "description": "b", "date": "0001-01-01T00:00:00Z"}"#;
        let draft = AppointmentDraft::from_json_lenient(body);
        assert!(matches!(
            draft.into_open_appointment(),
            Err(AppointmentError::InvalidAppointment)
        ));
    }

    #[test]
    fn test_appointment_serialization_omits_missing_id() {
        let appointment = Appointment {
            id: None,
            name: "Test".to_string(),
            description: "Test Appointment".to_string(),
            status: STATUS_OPEN.to_string(),
            date: parse_timestamp("2019-08-28T09:00:01+00:00").unwrap(),
        };

        assert_eq!(
            serde_json::to_string(&appointment).unwrap(),
            r#"{"name":"Test","description":"Test Appointment","status":"open","date":"2019-08-28T09:00:01Z"}"#
        );

        let id: AppointmentId = "7d2a3c1e-8f5b-4a8e-9c1d-2b3e4f5a6b7c".parse().unwrap();
        let with_id = Appointment { id: Some(id), ..appointment };
        let value = serde_json::to_value(&with_id).unwrap();
        assert_eq!(value["id"], "7d2a3c1e-8f5b-4a8e-9c1d-2b3e4f5a6b7c");
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        assert!(matches!(
            "000000000000000000000000".parse::<AppointmentId>(),
            Err(AppointmentError::InvalidId(_))
        ));
    }

    #[test]
    fn test_status_update_display_and_decode() {
        let update = StatusUpdate::from_json_lenient(br#"{"Status": "closed"}"#);
        assert_eq!(update.status, STATUS_CLOSED);
        assert_eq!(update.to_string(), "{closed}");

        let empty = StatusUpdate::from_json_lenient(b"");
        assert_eq!(empty.to_string(), "{}");
    }

    #[test]
    fn test_parse_timestamp_normalises_to_utc() {
        let date = parse_timestamp("2019-08-28T11:00:01+02:00").unwrap();
        assert_eq!(date, parse_timestamp("2019-08-28T09:00:01Z").unwrap());
        assert!(parse_timestamp("2019-08-28 09:00:01").is_none());
    }

    #[test]
    fn test_row_conversion_assigns_id() {
        let row: AppointmentRow = serde_json::from_value(json!({
            "id": "7d2a3c1e-8f5b-4a8e-9c1d-2b3e4f5a6b7c",
            "name": "Tyres",
            "description": "Winter tyres",
            "status": "open",
            "date": "2019-08-28T09:00:01+00:00"
        }))
        .unwrap();

        let appointment = Appointment::from(row);
        assert_eq!(
            appointment.id.map(|id| id.to_string()).as_deref(),
            Some("7d2a3c1e-8f5b-4a8e-9c1d-2b3e4f5a6b7c")
        );
        assert_eq!(appointment.name, "Tyres");
    }
}
