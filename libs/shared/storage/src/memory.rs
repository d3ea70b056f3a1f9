use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::{Booking, BookingStatus, Patient, Slot, Weekday, WeeklyConfig};

use crate::repos::{BookingRepository, ConfigRepository, PatientRepository, SlotRepository};
use crate::StorageError;

/// In-process store backing tests and unconfigured local runs. One lock per
/// entity table; the engine itself serializes each request, so contention
/// here is not a concern.
#[derive(Default)]
pub struct MemoryStore {
    configs: RwLock<HashMap<Uuid, WeeklyConfig>>,
    slots: RwLock<HashMap<Uuid, Slot>>,
    bookings: RwLock<HashMap<Uuid, Booking>>,
    patients: RwLock<HashMap<Uuid, Patient>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigRepository for MemoryStore {
    async fn insert(&self, config: WeeklyConfig) -> Result<WeeklyConfig, StorageError> {
        self.configs.write().await.insert(config.id, config.clone());
        Ok(config)
    }

    async fn update(&self, config: &WeeklyConfig) -> Result<WeeklyConfig, StorageError> {
        let mut table = self.configs.write().await;
        if !table.contains_key(&config.id) {
            return Err(StorageError::NotFound);
        }
        table.insert(config.id, config.clone());
        Ok(config.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        self.configs.write().await.remove(&id);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WeeklyConfig>, StorageError> {
        Ok(self.configs.read().await.get(&id).cloned())
    }

    async fn find_active(
        &self,
        clinician_id: Uuid,
        weekday: Weekday,
    ) -> Result<Option<WeeklyConfig>, StorageError> {
        Ok(self
            .configs
            .read()
            .await
            .values()
            .find(|c| c.clinician_id == clinician_id && c.weekday == weekday && c.active)
            .cloned())
    }

    async fn find_active_by_clinician(
        &self,
        clinician_id: Uuid,
    ) -> Result<Vec<WeeklyConfig>, StorageError> {
        let mut configs: Vec<WeeklyConfig> = self
            .configs
            .read()
            .await
            .values()
            .filter(|c| c.clinician_id == clinician_id && c.active)
            .cloned()
            .collect();
        configs.sort_by_key(|c| c.weekday.to_chrono().num_days_from_monday());
        Ok(configs)
    }
}

#[async_trait]
impl SlotRepository for MemoryStore {
    async fn insert_batch(&self, slots: Vec<Slot>) -> Result<Vec<Slot>, StorageError> {
        let mut table = self.slots.write().await;
        for slot in &slots {
            table.insert(slot.id, slot.clone());
        }
        Ok(slots)
    }

    async fn update(&self, slot: &Slot) -> Result<Slot, StorageError> {
        let mut table = self.slots.write().await;
        if !table.contains_key(&slot.id) {
            return Err(StorageError::NotFound);
        }
        table.insert(slot.id, slot.clone());
        Ok(slot.clone())
    }

    async fn delete_by_config(&self, config_id: Uuid) -> Result<(), StorageError> {
        self.slots
            .write()
            .await
            .retain(|_, slot| slot.config_id != config_id);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Slot>, StorageError> {
        Ok(self.slots.read().await.get(&id).cloned())
    }

    async fn find_by_config(&self, config_id: Uuid) -> Result<Vec<Slot>, StorageError> {
        let mut slots: Vec<Slot> = self
            .slots
            .read()
            .await
            .values()
            .filter(|s| s.config_id == config_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.start);
        Ok(slots)
    }

    async fn find_by_clinician_weekday(
        &self,
        clinician_id: Uuid,
        weekday: Weekday,
    ) -> Result<Vec<Slot>, StorageError> {
        let mut slots: Vec<Slot> = self
            .slots
            .read()
            .await
            .values()
            .filter(|s| s.clinician_id == clinician_id && s.weekday == weekday)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.start);
        Ok(slots)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert(&self, booking: Booking) -> Result<Booking, StorageError> {
        self.bookings
            .write()
            .await
            .insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn insert_batch(&self, bookings: Vec<Booking>) -> Result<Vec<Booking>, StorageError> {
        let mut table = self.bookings.write().await;
        for booking in &bookings {
            table.insert(booking.id, booking.clone());
        }
        Ok(bookings)
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, StorageError> {
        let mut table = self.bookings.write().await;
        if !table.contains_key(&booking.id) {
            return Err(StorageError::NotFound);
        }
        table.insert(booking.id, booking.clone());
        Ok(booking.clone())
    }

    async fn delete_batch(&self, ids: &[Uuid]) -> Result<(), StorageError> {
        let mut table = self.bookings.write().await;
        for id in ids {
            table.remove(id);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, StorageError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn count_for_clinician(&self, clinician_id: Uuid) -> Result<u64, StorageError> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.clinician_id == clinician_id)
            .count() as u64)
    }

    async fn find_scheduled_on_date(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StorageError> {
        self.collect_sorted(|b| {
            b.clinician_id == clinician_id && b.date == date && b.is_scheduled()
        })
        .await
    }

    async fn find_by_clinician(&self, clinician_id: Uuid) -> Result<Vec<Booking>, StorageError> {
        self.collect_sorted(|b| b.clinician_id == clinician_id && b.active)
            .await
    }

    async fn find_by_clinician_in_period(
        &self,
        clinician_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Booking>, StorageError> {
        self.collect_sorted(|b| {
            b.clinician_id == clinician_id && b.active && b.date >= from && b.date <= to
        })
        .await
    }

    async fn find_by_clinician_and_status(
        &self,
        clinician_id: Uuid,
        status: BookingStatus,
    ) -> Result<Vec<Booking>, StorageError> {
        self.collect_sorted(|b| b.clinician_id == clinician_id && b.active && b.status == status)
            .await
    }

    async fn find_by_patient(
        &self,
        patient_id: Uuid,
        only_active: bool,
    ) -> Result<Vec<Booking>, StorageError> {
        self.collect_sorted(|b| b.patient_id == patient_id && (!only_active || b.active))
            .await
    }

    async fn find_scheduled_by_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Booking>, StorageError> {
        self.collect_sorted(|b| b.patient_id == patient_id && b.is_scheduled())
            .await
    }

    async fn find_by_series(&self, series_id: Uuid) -> Result<Vec<Booking>, StorageError> {
        self.collect_sorted(|b| b.series_id == series_id && b.active)
            .await
    }

    async fn find_by_slot(&self, slot_id: Uuid) -> Result<Vec<Booking>, StorageError> {
        self.collect_sorted(|b| b.slot_id == Some(slot_id) && b.active)
            .await
    }
}

impl MemoryStore {
    async fn collect_sorted<F>(&self, predicate: F) -> Result<Vec<Booking>, StorageError>
    where
        F: Fn(&Booking) -> bool,
    {
        let mut bookings: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| predicate(b))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.date, b.start));
        Ok(bookings)
    }
}

#[async_trait]
impl PatientRepository for MemoryStore {
    async fn insert(&self, patient: Patient) -> Result<Patient, StorageError> {
        self.patients
            .write()
            .await
            .insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn update(&self, patient: &Patient) -> Result<Patient, StorageError> {
        let mut table = self.patients.write().await;
        if !table.contains_key(&patient.id) {
            return Err(StorageError::NotFound);
        }
        table.insert(patient.id, patient.clone());
        Ok(patient.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Patient>, StorageError> {
        Ok(self.patients.read().await.get(&id).cloned())
    }

    async fn find_by_clinician(&self, clinician_id: Uuid) -> Result<Vec<Patient>, StorageError> {
        let mut patients: Vec<Patient> = self
            .patients
            .read()
            .await
            .values()
            .filter(|p| p.clinician_id == clinician_id)
            .cloned()
            .collect();
        patients.sort_by_key(|p| p.created_at);
        Ok(patients)
    }
}
