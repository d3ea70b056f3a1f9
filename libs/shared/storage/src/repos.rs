use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use shared_models::{Booking, BookingStatus, Patient, Slot, Weekday, WeeklyConfig};

use crate::StorageError;

#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn insert(&self, config: WeeklyConfig) -> Result<WeeklyConfig, StorageError>;
    async fn update(&self, config: &WeeklyConfig) -> Result<WeeklyConfig, StorageError>;
    async fn delete(&self, id: Uuid) -> Result<(), StorageError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<WeeklyConfig>, StorageError>;
    async fn find_active(
        &self,
        clinician_id: Uuid,
        weekday: Weekday,
    ) -> Result<Option<WeeklyConfig>, StorageError>;
    /// Active configurations of one clinician, ordered by weekday.
    async fn find_active_by_clinician(
        &self,
        clinician_id: Uuid,
    ) -> Result<Vec<WeeklyConfig>, StorageError>;
}

#[async_trait]
pub trait SlotRepository: Send + Sync {
    async fn insert_batch(&self, slots: Vec<Slot>) -> Result<Vec<Slot>, StorageError>;
    async fn update(&self, slot: &Slot) -> Result<Slot, StorageError>;
    async fn delete_by_config(&self, config_id: Uuid) -> Result<(), StorageError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Slot>, StorageError>;
    async fn find_by_config(&self, config_id: Uuid) -> Result<Vec<Slot>, StorageError>;
    /// All slots of one clinician on one weekday, ordered by start time.
    async fn find_by_clinician_weekday(
        &self,
        clinician_id: Uuid,
        weekday: Weekday,
    ) -> Result<Vec<Slot>, StorageError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: Booking) -> Result<Booking, StorageError>;
    async fn insert_batch(&self, bookings: Vec<Booking>) -> Result<Vec<Booking>, StorageError>;
    async fn update(&self, booking: &Booking) -> Result<Booking, StorageError>;
    async fn delete_batch(&self, ids: &[Uuid]) -> Result<(), StorageError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, StorageError>;
    /// Total bookings stored for a clinician, any status. Lets the conflict
    /// detector short-circuit a cold system.
    async fn count_for_clinician(&self, clinician_id: Uuid) -> Result<u64, StorageError>;
    /// Scheduled, active bookings of one clinician on one date.
    async fn find_scheduled_on_date(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StorageError>;
    /// Active bookings of one clinician, ordered by date.
    async fn find_by_clinician(&self, clinician_id: Uuid) -> Result<Vec<Booking>, StorageError>;
    /// Active bookings of one clinician within [from, to], ordered by date.
    async fn find_by_clinician_in_period(
        &self,
        clinician_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Booking>, StorageError>;
    /// Active bookings of one clinician with the given status, ordered by date.
    async fn find_by_clinician_and_status(
        &self,
        clinician_id: Uuid,
        status: BookingStatus,
    ) -> Result<Vec<Booking>, StorageError>;
    /// Bookings of one patient, ordered by date. `only_active` filters the
    /// soft-deleted ones out.
    async fn find_by_patient(
        &self,
        patient_id: Uuid,
        only_active: bool,
    ) -> Result<Vec<Booking>, StorageError>;
    /// Scheduled, active bookings of one patient, ordered by date.
    async fn find_scheduled_by_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Booking>, StorageError>;
    /// Active bookings of one series, ordered by date.
    async fn find_by_series(&self, series_id: Uuid) -> Result<Vec<Booking>, StorageError>;
    /// Active bookings referencing one slot, ordered by date.
    async fn find_by_slot(&self, slot_id: Uuid) -> Result<Vec<Booking>, StorageError>;
}

#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn insert(&self, patient: Patient) -> Result<Patient, StorageError>;
    async fn update(&self, patient: &Patient) -> Result<Patient, StorageError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Patient>, StorageError>;
    /// Patients of one clinician, ordered by creation time.
    async fn find_by_clinician(&self, clinician_id: Uuid) -> Result<Vec<Patient>, StorageError>;
}
