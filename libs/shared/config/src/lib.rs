use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

pub const DEFAULT_PORT: &str = "8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 200;

/// Which backing store serves the appointment routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Supabase,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(StoreBackend::Memory),
            "supabase" | "postgrest" => Ok(StoreBackend::Supabase),
            other => Err(format!("unknown appointment store '{}'", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Supabase => write!(f, "supabase"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: String,
    pub store_backend: StoreBackend,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: Option<String>,
    pub request_timeout: Duration,
    pub cors_allowed_methods: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            store_backend: StoreBackend::Memory,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_key: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cors_allowed_methods: vec!["GET".to_string()],
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(port) if !port.trim().is_empty() => port.trim().to_string(),
            _ => {
                info!("No port set. Setting port to {}.", DEFAULT_PORT);
                defaults.port
            }
        };

        let store_backend = match env::var("APPOINTMENT_STORE") {
            Ok(value) if !value.trim().is_empty() => value.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to {}", e, defaults.store_backend);
                defaults.store_backend
            }),
            _ => {
                warn!("APPOINTMENT_STORE not set, using {}", defaults.store_backend);
                defaults.store_backend
            }
        };

        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|value| match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    warn!("Invalid REQUEST_TIMEOUT_SECS '{}', using default", value);
                    None
                }
            })
            .unwrap_or(defaults.request_timeout);

        let cors_allowed_methods = env::var("CORS_ALLOWED_METHODS")
            .ok()
            .map(|value| parse_method_list(&value))
            .filter(|methods| !methods.is_empty())
            .unwrap_or(defaults.cors_allowed_methods);

        let config = Self {
            port,
            store_backend,
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            request_timeout,
            cors_allowed_methods,
        };

        if config.store_backend == StoreBackend::Supabase && !config.is_supabase_configured() {
            warn!("Supabase store selected but SUPABASE_URL / SUPABASE_ANON_PUBLIC_KEY are missing");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_method_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|method| method.trim().to_ascii_uppercase())
        .filter(|method| !method.is_empty())
        .collect()
}
