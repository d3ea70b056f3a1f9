use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use session_cell::services::conflict::ConflictService;
use shared_models::{Booking, BookingStatus};
use shared_storage::Store;

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()
}

async fn seed(store: &Store, clinician_id: Uuid, status: BookingStatus, active: bool) -> Booking {
    store
        .bookings
        .insert(Booking {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            clinician_id,
            slot_id: None,
            series_id: Uuid::new_v4(),
            sequence: 1,
            date: monday(),
            start: time(9, 0),
            end: time(9, 50),
            status,
            active,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn cold_system_short_circuits_to_available() {
    let store = Store::memory();
    let service = ConflictService::new(store);

    let conflict = service
        .has_conflict(Uuid::new_v4(), monday(), time(9, 0), time(9, 50))
        .await
        .unwrap();
    assert!(!conflict);
}

#[tokio::test]
async fn exact_duplicate_is_a_conflict() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    seed(&store, clinician_id, BookingStatus::Scheduled, true).await;
    let service = ConflictService::new(store);

    assert!(service
        .has_conflict(clinician_id, monday(), time(9, 0), time(9, 50))
        .await
        .unwrap());
}

#[tokio::test]
async fn adjacent_interval_is_not_a_conflict() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    seed(&store, clinician_id, BookingStatus::Scheduled, true).await;
    let service = ConflictService::new(store);

    // Starts exactly where the existing one ends.
    assert!(!service
        .has_conflict(clinician_id, monday(), time(9, 50), time(10, 40))
        .await
        .unwrap());
    // Ends exactly where the existing one starts.
    assert!(!service
        .has_conflict(clinician_id, monday(), time(8, 10), time(9, 0))
        .await
        .unwrap());
}

#[tokio::test]
async fn only_scheduled_active_bookings_conflict() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    seed(&store, clinician_id, BookingStatus::Cancelled, false).await;
    seed(&store, clinician_id, BookingStatus::Done, true).await;
    let service = ConflictService::new(store);

    assert!(!service
        .has_conflict(clinician_id, monday(), time(9, 0), time(9, 50))
        .await
        .unwrap());
}

#[tokio::test]
async fn other_clinicians_bookings_are_invisible() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    seed(&store, Uuid::new_v4(), BookingStatus::Scheduled, true).await;
    let service = ConflictService::new(store);

    assert!(!service
        .has_conflict(clinician_id, monday(), time(9, 0), time(9, 50))
        .await
        .unwrap());
}

#[tokio::test]
async fn find_conflicting_names_the_offender() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    let offender = seed(&store, clinician_id, BookingStatus::Scheduled, true).await;
    let service = ConflictService::new(store);

    let conflicting = service
        .find_conflicting(clinician_id, monday(), time(9, 30), time(10, 20))
        .await
        .unwrap();
    assert_eq!(conflicting.len(), 1);
    assert_eq!(conflicting[0].id, offender.id);
}

#[tokio::test]
async fn excluded_booking_is_skipped() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    let existing = seed(&store, clinician_id, BookingStatus::Scheduled, true).await;
    let service = ConflictService::new(store);

    assert!(!service
        .has_conflict_excluding(
            clinician_id,
            monday(),
            time(9, 0),
            time(9, 50),
            Some(existing.id)
        )
        .await
        .unwrap());
}
