use std::env;
use tracing::warn;

/// Session length is a clinic-wide constant, not a per-configuration field.
/// The step interval of a weekly configuration controls the spacing between
/// successive session starts; the duration controls how long each one lasts.
pub const DEFAULT_SESSION_DURATION_MINUTES: i64 = 50;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_api_key: String,
    pub session_duration_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            database_url: env::var("DATABASE_REST_URL").unwrap_or_else(|_| {
                warn!("DATABASE_REST_URL not set, using empty value");
                String::new()
            }),
            database_api_key: env::var("DATABASE_API_KEY").unwrap_or_else(|_| {
                warn!("DATABASE_API_KEY not set, using empty value");
                String::new()
            }),
            session_duration_minutes: env::var("SESSION_DURATION_MINUTES")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_SESSION_DURATION_MINUTES),
        };

        if !config.is_configured() {
            warn!("No storage backend configured - the API will use the in-memory store");
        }

        config
    }

    /// True when the REST storage backend can be reached. When false the API
    /// runs against the in-memory store, which is only useful locally.
    pub fn is_configured(&self) -> bool {
        !self.database_url.is_empty() && !self.database_api_key.is_empty()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            database_api_key: String::new(),
            session_duration_minutes: DEFAULT_SESSION_DURATION_MINUTES,
        }
    }
}
