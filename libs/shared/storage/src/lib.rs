pub mod memory;
pub mod repos;
pub mod rest;

use std::sync::Arc;

use thiserror::Error;

use shared_config::AppConfig;
use shared_utils::{Clock, SystemClock};

pub use repos::{BookingRepository, ConfigRepository, PatientRepository, SlotRepository};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Bundle of the per-entity repositories the engine runs against. The
/// services never know which backend is behind the trait objects.
#[derive(Clone)]
pub struct Store {
    pub configs: Arc<dyn ConfigRepository>,
    pub slots: Arc<dyn SlotRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub patients: Arc<dyn PatientRepository>,
}

impl Store {
    pub fn memory() -> Self {
        let inner = Arc::new(memory::MemoryStore::new());
        Self {
            configs: inner.clone(),
            slots: inner.clone(),
            bookings: inner.clone(),
            patients: inner,
        }
    }

    pub fn rest(config: &AppConfig) -> Self {
        let client = Arc::new(rest::RestClient::new(config));
        Self {
            configs: Arc::new(rest::RestConfigRepository::new(client.clone())),
            slots: Arc::new(rest::RestSlotRepository::new(client.clone())),
            bookings: Arc::new(rest::RestBookingRepository::new(client.clone())),
            patients: Arc::new(rest::RestPatientRepository::new(client)),
        }
    }

    /// REST backend when the environment names one, in-memory otherwise.
    pub fn from_config(config: &AppConfig) -> Self {
        if config.is_configured() {
            Self::rest(config)
        } else {
            Self::memory()
        }
    }
}

/// Shared application state handed to every cell router.
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub store: Store,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    pub fn new(config: AppConfig, store: Store, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }

    pub fn from_env() -> Self {
        let config = AppConfig::from_env();
        let store = Store::from_config(&config);
        Self::new(config, store, Arc::new(SystemClock))
    }
}
