use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::{AppConfig, StoreBackend};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_key: Some("test-service-key".to_string()),
        }
    }
}

impl TestConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_backend: StoreBackend::Supabase,
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            ..AppConfig::default()
        }
    }
}

/// Parse an RFC 3339 timestamp, panicking on malformed fixtures.
pub fn test_date(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .unwrap_or_else(|e| panic!("bad fixture date {}: {}", value, e))
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn appointment_row(id: Uuid, name: &str, status: &str, date: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "description": format!("{} description", name),
            "status": status,
            "date": date
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code,
            "details": null,
            "hint": null
        })
    }
}
