use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{Booking, BookingStatus, Patient, Slot, Weekday, WeeklyConfig};

use crate::repos::{BookingRepository, ConfigRepository, PatientRepository, SlotRepository};
use crate::StorageError;

/// Thin PostgREST client. Filters are query-string expressions
/// (`column=eq.value`), representation is requested back on writes.
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.database_url.clone(),
            api_key: config.database_api_key.clone(),
        }
    }

    fn headers(&self, returning: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if returning {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }
        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        returning: bool,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(returning));
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Storage API error ({}): {}", status, error_text);
            return Err(anyhow!("storage API error ({}): {}", status, error_text));
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }
}

fn backend_err(err: anyhow::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn first_row<T>(mut rows: Vec<T>) -> Result<T, StorageError> {
    if rows.is_empty() {
        return Err(StorageError::Backend(
            "write returned no representation".to_string(),
        ));
    }
    Ok(rows.swap_remove(0))
}

async fn fetch_rows<T: DeserializeOwned>(
    client: &RestClient,
    path: &str,
) -> Result<Vec<T>, StorageError> {
    client
        .request::<Vec<T>>(Method::GET, path, None, false)
        .await
        .map_err(backend_err)
}

async fn insert_rows<T: serde::Serialize + DeserializeOwned>(
    client: &RestClient,
    table: &str,
    rows: &[T],
) -> Result<Vec<T>, StorageError> {
    let body = serde_json::to_value(rows)
        .map_err(|e| StorageError::Backend(format!("failed to serialize rows: {}", e)))?;
    client
        .request::<Vec<T>>(Method::POST, &format!("/rest/v1/{}", table), Some(body), true)
        .await
        .map_err(backend_err)
}

async fn patch_row<T: serde::Serialize + DeserializeOwned>(
    client: &RestClient,
    table: &str,
    id: Uuid,
    row: &T,
) -> Result<T, StorageError> {
    let body = serde_json::to_value(row)
        .map_err(|e| StorageError::Backend(format!("failed to serialize row: {}", e)))?;
    let rows: Vec<T> = client
        .request(
            Method::PATCH,
            &format!("/rest/v1/{}?id=eq.{}", table, id),
            Some(body),
            true,
        )
        .await
        .map_err(backend_err)?;
    if rows.is_empty() {
        return Err(StorageError::NotFound);
    }
    first_row(rows)
}

// Representation is requested so the body is a JSON array rather than the
// empty 204 PostgREST sends otherwise.
async fn delete_where(client: &RestClient, table: &str, filter: &str) -> Result<(), StorageError> {
    let _: Vec<Value> = client
        .request(
            Method::DELETE,
            &format!("/rest/v1/{}?{}", table, filter),
            None,
            true,
        )
        .await
        .map_err(backend_err)?;
    Ok(())
}

// ==============================================================================
// WEEKLY CONFIGURATIONS
// ==============================================================================

pub struct RestConfigRepository {
    client: Arc<RestClient>,
}

impl RestConfigRepository {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigRepository for RestConfigRepository {
    async fn insert(&self, config: WeeklyConfig) -> Result<WeeklyConfig, StorageError> {
        first_row(insert_rows(&self.client, "weekly_configurations", &[config]).await?)
    }

    async fn update(&self, config: &WeeklyConfig) -> Result<WeeklyConfig, StorageError> {
        patch_row(&self.client, "weekly_configurations", config.id, config).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        delete_where(
            &self.client,
            "weekly_configurations",
            &format!("id=eq.{}", id),
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WeeklyConfig>, StorageError> {
        let path = format!("/rest/v1/weekly_configurations?id=eq.{}", id);
        Ok(fetch_rows(&self.client, &path).await?.into_iter().next())
    }

    async fn find_active(
        &self,
        clinician_id: Uuid,
        weekday: Weekday,
    ) -> Result<Option<WeeklyConfig>, StorageError> {
        let path = format!(
            "/rest/v1/weekly_configurations?clinician_id=eq.{}&weekday=eq.{}&active=eq.true",
            clinician_id, weekday
        );
        Ok(fetch_rows(&self.client, &path).await?.into_iter().next())
    }

    async fn find_active_by_clinician(
        &self,
        clinician_id: Uuid,
    ) -> Result<Vec<WeeklyConfig>, StorageError> {
        let path = format!(
            "/rest/v1/weekly_configurations?clinician_id=eq.{}&active=eq.true&order=weekday.asc",
            clinician_id
        );
        fetch_rows(&self.client, &path).await
    }
}

// ==============================================================================
// SLOTS
// ==============================================================================

pub struct RestSlotRepository {
    client: Arc<RestClient>,
}

impl RestSlotRepository {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SlotRepository for RestSlotRepository {
    async fn insert_batch(&self, slots: Vec<Slot>) -> Result<Vec<Slot>, StorageError> {
        if slots.is_empty() {
            return Ok(slots);
        }
        insert_rows(&self.client, "slots", &slots).await
    }

    async fn update(&self, slot: &Slot) -> Result<Slot, StorageError> {
        patch_row(&self.client, "slots", slot.id, slot).await
    }

    async fn delete_by_config(&self, config_id: Uuid) -> Result<(), StorageError> {
        delete_where(&self.client, "slots", &format!("config_id=eq.{}", config_id)).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Slot>, StorageError> {
        let path = format!("/rest/v1/slots?id=eq.{}", id);
        Ok(fetch_rows(&self.client, &path).await?.into_iter().next())
    }

    async fn find_by_config(&self, config_id: Uuid) -> Result<Vec<Slot>, StorageError> {
        let path = format!("/rest/v1/slots?config_id=eq.{}&order=start.asc", config_id);
        fetch_rows(&self.client, &path).await
    }

    async fn find_by_clinician_weekday(
        &self,
        clinician_id: Uuid,
        weekday: Weekday,
    ) -> Result<Vec<Slot>, StorageError> {
        let path = format!(
            "/rest/v1/slots?clinician_id=eq.{}&weekday=eq.{}&order=start.asc",
            clinician_id, weekday
        );
        fetch_rows(&self.client, &path).await
    }
}

// ==============================================================================
// BOOKINGS
// ==============================================================================

pub struct RestBookingRepository {
    client: Arc<RestClient>,
}

impl RestBookingRepository {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BookingRepository for RestBookingRepository {
    async fn insert(&self, booking: Booking) -> Result<Booking, StorageError> {
        first_row(insert_rows(&self.client, "bookings", &[booking]).await?)
    }

    async fn insert_batch(&self, bookings: Vec<Booking>) -> Result<Vec<Booking>, StorageError> {
        if bookings.is_empty() {
            return Ok(bookings);
        }
        insert_rows(&self.client, "bookings", &bookings).await
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, StorageError> {
        patch_row(&self.client, "bookings", booking.id, booking).await
    }

    async fn delete_batch(&self, ids: &[Uuid]) -> Result<(), StorageError> {
        if ids.is_empty() {
            return Ok(());
        }
        let joined = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        delete_where(&self.client, "bookings", &format!("id=in.({})", joined)).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, StorageError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", id);
        Ok(fetch_rows(&self.client, &path).await?.into_iter().next())
    }

    async fn count_for_clinician(&self, clinician_id: Uuid) -> Result<u64, StorageError> {
        let path = format!(
            "/rest/v1/bookings?clinician_id=eq.{}&select=id",
            clinician_id
        );
        let rows: Vec<Value> = fetch_rows(&self.client, &path).await?;
        Ok(rows.len() as u64)
    }

    async fn find_scheduled_on_date(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StorageError> {
        let path = format!(
            "/rest/v1/bookings?clinician_id=eq.{}&date=eq.{}&status=eq.{}&active=eq.true&order=start.asc",
            clinician_id,
            date,
            BookingStatus::Scheduled
        );
        fetch_rows(&self.client, &path).await
    }

    async fn find_by_clinician(&self, clinician_id: Uuid) -> Result<Vec<Booking>, StorageError> {
        let path = format!(
            "/rest/v1/bookings?clinician_id=eq.{}&active=eq.true&order=date.asc,start.asc",
            clinician_id
        );
        fetch_rows(&self.client, &path).await
    }

    async fn find_by_clinician_in_period(
        &self,
        clinician_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Booking>, StorageError> {
        let path = format!(
            "/rest/v1/bookings?clinician_id=eq.{}&date=gte.{}&date=lte.{}&active=eq.true&order=date.asc,start.asc",
            clinician_id, from, to
        );
        fetch_rows(&self.client, &path).await
    }

    async fn find_by_clinician_and_status(
        &self,
        clinician_id: Uuid,
        status: BookingStatus,
    ) -> Result<Vec<Booking>, StorageError> {
        let path = format!(
            "/rest/v1/bookings?clinician_id=eq.{}&status=eq.{}&active=eq.true&order=date.asc,start.asc",
            clinician_id, status
        );
        fetch_rows(&self.client, &path).await
    }

    async fn find_by_patient(
        &self,
        patient_id: Uuid,
        only_active: bool,
    ) -> Result<Vec<Booking>, StorageError> {
        let mut path = format!(
            "/rest/v1/bookings?patient_id=eq.{}&order=date.asc,start.asc",
            patient_id
        );
        if only_active {
            path.push_str("&active=eq.true");
        }
        fetch_rows(&self.client, &path).await
    }

    async fn find_scheduled_by_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Booking>, StorageError> {
        let path = format!(
            "/rest/v1/bookings?patient_id=eq.{}&status=eq.{}&active=eq.true&order=date.asc,start.asc",
            patient_id,
            BookingStatus::Scheduled
        );
        fetch_rows(&self.client, &path).await
    }

    async fn find_by_series(&self, series_id: Uuid) -> Result<Vec<Booking>, StorageError> {
        let path = format!(
            "/rest/v1/bookings?series_id=eq.{}&active=eq.true&order=date.asc,start.asc",
            series_id
        );
        fetch_rows(&self.client, &path).await
    }

    async fn find_by_slot(&self, slot_id: Uuid) -> Result<Vec<Booking>, StorageError> {
        let path = format!(
            "/rest/v1/bookings?slot_id=eq.{}&active=eq.true&order=date.asc,start.asc",
            slot_id
        );
        fetch_rows(&self.client, &path).await
    }
}

// ==============================================================================
// PATIENTS
// ==============================================================================

pub struct RestPatientRepository {
    client: Arc<RestClient>,
}

impl RestPatientRepository {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PatientRepository for RestPatientRepository {
    async fn insert(&self, patient: Patient) -> Result<Patient, StorageError> {
        first_row(insert_rows(&self.client, "patients", &[patient]).await?)
    }

    async fn update(&self, patient: &Patient) -> Result<Patient, StorageError> {
        patch_row(&self.client, "patients", patient.id, patient).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Patient>, StorageError> {
        let path = format!("/rest/v1/patients?id=eq.{}", id);
        Ok(fetch_rows(&self.client, &path).await?.into_iter().next())
    }

    async fn find_by_clinician(&self, clinician_id: Uuid) -> Result<Vec<Patient>, StorageError> {
        let path = format!(
            "/rest/v1/patients?clinician_id=eq.{}&order=created_at.asc",
            clinician_id
        );
        fetch_rows(&self.client, &path).await
    }
}
