use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use agenda_cell::services::slots::SlotService;
use session_cell::services::series::SeriesService;
use shared_models::{Booking, BookingStatus, Patient};
use shared_storage::Store;
use shared_utils::Clock;

use crate::models::{
    CreatePatientRequest, CurrentSlotSummary, PatientError, PatientView, UpdatePatientRequest,
};

/// Patient lifecycle and its fan-out into slots and bookings: registration
/// with an initial series, pack resize, slot rebinding and
/// deactivation/reactivation.
pub struct PatientService {
    store: Store,
    series: SeriesService,
    slots: SlotService,
}

impl PatientService {
    pub fn new(store: Store, clock: Arc<dyn Clock>, session_duration: i64) -> Self {
        Self {
            series: SeriesService::new(store.clone(), clock.clone()),
            slots: SlotService::new(store.clone(), clock, session_duration),
            store,
        }
    }

    /// Registers a patient and materializes their first series on the chosen
    /// slot. The series plan is validated before the patient row is written,
    /// so a conflicting or occupied slot leaves nothing behind.
    pub async fn create_with_series(
        &self,
        clinician_id: Uuid,
        request: CreatePatientRequest,
    ) -> Result<(Patient, Vec<Booking>), PatientError> {
        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(PatientError::InvalidRequest(
                "patient name must not be empty".to_string(),
            ));
        }

        let patient_id = Uuid::new_v4();
        self.series
            .validate_series(patient_id, request.slot_id, request.session_count)
            .await?;

        let patient = self
            .store
            .patients
            .insert(Patient {
                id: patient_id,
                clinician_id,
                first_name: request.first_name,
                last_name: request.last_name,
                email: request.email,
                phone: request.phone,
                birth_date: request.birth_date,
                slot_id: Some(request.slot_id),
                sessions_per_pack: request.session_count,
                active: true,
                created_at: Utc::now(),
            })
            .await?;

        let bookings = self
            .series
            .create_series(patient.id, request.slot_id, request.session_count)
            .await?;

        info!(
            "Registered patient {} with {} sessions on slot {}",
            patient.id,
            bookings.len(),
            request.slot_id
        );
        Ok((patient, bookings))
    }

    pub async fn get(&self, patient_id: Uuid) -> Result<PatientView, PatientError> {
        let patient = self.require(patient_id).await?;

        let current_slot = match patient.slot_id {
            Some(slot_id) => {
                let slot = self.slots.get(slot_id).await?;
                let scheduled = self
                    .store
                    .bookings
                    .find_scheduled_by_patient(patient_id)
                    .await?;
                let series_id = scheduled.first().map(|b| b.series_id);
                Some(CurrentSlotSummary::new(&slot, series_id))
            }
            None => None,
        };

        Ok(PatientView {
            full_name: patient.full_name(),
            patient,
            current_slot,
        })
    }

    pub async fn list(&self, clinician_id: Uuid) -> Result<Vec<Patient>, PatientError> {
        Ok(self.store.patients.find_by_clinician(clinician_id).await?)
    }

    /// Updates profile fields; a changed pack size resizes the series.
    pub async fn update(
        &self,
        patient_id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        let mut patient = self.require(patient_id).await?;
        if !patient.active {
            return Err(PatientError::IllegalTransition(
                "an inactive patient cannot be updated".to_string(),
            ));
        }

        if let Some(first_name) = request.first_name {
            patient.first_name = first_name;
        }
        if let Some(last_name) = request.last_name {
            patient.last_name = last_name;
        }
        if let Some(email) = request.email {
            patient.email = Some(email);
        }
        if let Some(phone) = request.phone {
            patient.phone = Some(phone);
        }
        if let Some(birth_date) = request.birth_date {
            patient.birth_date = Some(birth_date);
        }

        if let Some(pack) = request.sessions_per_pack {
            if pack != patient.sessions_per_pack {
                debug!(
                    "Resizing pack of patient {} from {} to {}",
                    patient_id, patient.sessions_per_pack, pack
                );
                self.series.resize(patient_id, pack).await?;
                patient.sessions_per_pack = pack;
            }
        }

        Ok(self.store.patients.update(&patient).await?)
    }

    /// Moves the patient onto another weekly slot. The old slot is released,
    /// future scheduled sessions are re-planned on the new day and time.
    pub async fn rebind_slot(
        &self,
        patient_id: Uuid,
        new_slot_id: Uuid,
    ) -> Result<Vec<Booking>, PatientError> {
        let mut patient = self.require(patient_id).await?;
        if !patient.active {
            return Err(PatientError::IllegalTransition(
                "an inactive patient cannot be rebound".to_string(),
            ));
        }

        let bookings = self
            .series
            .rebind(patient_id, patient.slot_id, new_slot_id)
            .await?;

        patient.slot_id = Some(new_slot_id);
        self.store.patients.update(&patient).await?;
        Ok(bookings)
    }

    /// Deactivates the patient: the bound slot is released and the bookings
    /// are cleared under the history-preserving policy: realized sessions
    /// stay as soft-deleted rows, everything else is physically removed.
    pub async fn deactivate(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        let mut patient = self.require(patient_id).await?;

        let bookings = self.store.bookings.find_by_patient(patient_id, false).await?;
        let mut to_delete = Vec::new();
        for mut booking in bookings {
            if booking.status == BookingStatus::Done {
                if booking.active {
                    booking.active = false;
                    booking.updated_at = Some(Utc::now());
                    self.store.bookings.update(&booking).await?;
                }
            } else {
                to_delete.push(booking.id);
            }
        }
        if !to_delete.is_empty() {
            self.store.bookings.delete_batch(&to_delete).await?;
        }

        if let Some(slot_id) = patient.slot_id.take() {
            self.slots.release(slot_id).await?;
        }

        patient.active = false;
        let patient = self.store.patients.update(&patient).await?;
        info!(
            "Deactivated patient {}; removed {} pending bookings",
            patient_id,
            to_delete.len()
        );
        Ok(patient)
    }

    /// Flips the active flag back on. Nothing is regenerated; the clinician
    /// assigns a new slot and series explicitly.
    pub async fn reactivate(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        let mut patient = self.require(patient_id).await?;
        patient.active = true;
        Ok(self.store.patients.update(&patient).await?)
    }

    async fn require(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        self.store
            .patients
            .find_by_id(patient_id)
            .await?
            .ok_or_else(|| PatientError::NotFound("patient".to_string()))
    }
}
