use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use agenda_cell::models::{SaveConfigRequest, ScheduleError};
use agenda_cell::services::config::ConfigService;
use shared_models::{Booking, BookingStatus, Weekday};
use shared_storage::Store;
use shared_utils::FixedClock;

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn request(weekday: Weekday) -> SaveConfigRequest {
    SaveConfigRequest {
        weekday,
        work_start: time(8, 0),
        work_end: time(18, 0),
        break_start: Some(time(12, 0)),
        break_end: Some(time(13, 0)),
        step_minutes: 60,
    }
}

fn service(store: &Store) -> ConfigService {
    // Friday 2026-08-28 09:00.
    ConfigService::new(store.clone(), Arc::new(FixedClock::at(2026, 8, 28, 9, 0)), 50)
}

#[tokio::test]
async fn save_creates_config_and_slots() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();

    let (config, slots) = service(&store)
        .save(clinician_id, request(Weekday::Monday))
        .await
        .unwrap();

    assert_eq!(config.clinician_id, clinician_id);
    assert_eq!(config.weekday, Weekday::Monday);
    assert!(config.updated_at.is_none());

    // Hourly day with a lunch break, 50-minute sessions.
    assert_eq!(slots.len(), 9);
    assert_eq!(slots[0].start, time(8, 0));
    assert_eq!(slots[0].end, time(8, 50));
    assert!(!slots.iter().any(|s| s.start == time(12, 0)));
    assert_eq!(slots.last().unwrap().start, time(17, 0));
}

#[tokio::test]
async fn saving_twice_updates_in_place() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    let service = service(&store);

    let (first, _) = service
        .save(clinician_id, request(Weekday::Monday))
        .await
        .unwrap();

    let mut edited = request(Weekday::Monday);
    edited.work_end = time(16, 0);
    let (second, slots) = service.save(clinician_id, edited).await.unwrap();

    assert_eq!(second.id, first.id);
    assert!(second.updated_at.is_some());
    assert_eq!(slots.last().unwrap().start, time(15, 0));

    let all = store.configs.find_active_by_clinician(clinician_id).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn regeneration_is_idempotent() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    let service = service(&store);

    let (_, first) = service
        .save(clinician_id, request(Weekday::Tuesday))
        .await
        .unwrap();
    let (_, second) = service
        .save(clinician_id, request(Weekday::Tuesday))
        .await
        .unwrap();

    let starts = |slots: &[shared_models::Slot]| -> Vec<NaiveTime> {
        slots.iter().map(|s| s.start).collect()
    };
    assert_eq!(starts(&first), starts(&second));
}

#[tokio::test]
async fn invalid_window_is_rejected() {
    let store = Store::memory();
    let mut bad = request(Weekday::Monday);
    bad.work_start = time(18, 0);
    bad.work_end = time(8, 0);

    let err = service(&store)
        .save(Uuid::new_v4(), bad)
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::InvalidConfiguration(_));
}

#[tokio::test]
async fn break_outside_window_is_rejected() {
    let store = Store::memory();
    let mut bad = request(Weekday::Monday);
    bad.break_start = Some(time(7, 0));

    let err = service(&store)
        .save(Uuid::new_v4(), bad)
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::InvalidConfiguration(_));
}

#[tokio::test]
async fn edit_conflicting_with_scheduled_sessions_is_refused() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    let service = service(&store);
    service
        .save(clinician_id, request(Weekday::Monday))
        .await
        .unwrap();

    // A session scheduled for next Monday at 08:30, off the hourly grid.
    store
        .bookings
        .insert(Booking {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            clinician_id,
            slot_id: None,
            series_id: Uuid::new_v4(),
            sequence: 1,
            date: NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(),
            start: time(8, 30),
            end: time(9, 20),
            status: BookingStatus::Scheduled,
            active: true,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        })
        .await
        .unwrap();

    let err = service
        .save(clinician_id, request(Weekday::Monday))
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::Conflict(_));
}

#[tokio::test]
async fn delete_removes_config_and_slots() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    let service = service(&store);
    let (config, _) = service
        .save(clinician_id, request(Weekday::Monday))
        .await
        .unwrap();

    service.delete(config.id).await.unwrap();

    assert!(store.configs.find_by_id(config.id).await.unwrap().is_none());
    assert!(store.slots.find_by_config(config.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_is_refused_while_a_slot_is_occupied() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    let service = service(&store);
    let (config, slots) = service
        .save(clinician_id, request(Weekday::Monday))
        .await
        .unwrap();

    let mut bound = slots[0].clone();
    bound.patient_id = Some(Uuid::new_v4());
    bound.active = false;
    store.slots.update(&bound).await.unwrap();

    let err = service.delete(config.id).await.unwrap_err();
    assert_matches!(err, ScheduleError::SlotOccupied(_));
    assert!(store.configs.find_by_id(config.id).await.unwrap().is_some());
}

#[tokio::test]
async fn delete_preserves_done_sessions_as_history() {
    let store = Store::memory();
    let clinician_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let service = service(&store);
    let (config, slots) = service
        .save(clinician_id, request(Weekday::Monday))
        .await
        .unwrap();

    let booking = |status: BookingStatus, day: u32| Booking {
        id: Uuid::new_v4(),
        patient_id,
        clinician_id,
        slot_id: Some(slots[0].id),
        series_id: Uuid::new_v4(),
        sequence: 1,
        date: NaiveDate::from_ymd_opt(2026, 9, day).unwrap(),
        start: slots[0].start,
        end: slots[0].end,
        status,
        active: true,
        notes: None,
        created_at: Utc::now(),
        updated_at: None,
    };
    let done = store.bookings.insert(booking(BookingStatus::Done, 7)).await.unwrap();
    let pending = store
        .bookings
        .insert(booking(BookingStatus::Scheduled, 14))
        .await
        .unwrap();

    service.delete(config.id).await.unwrap();

    // Realized history survives soft-deleted, the pending one is gone.
    let kept = store.bookings.find_by_id(done.id).await.unwrap().unwrap();
    assert!(!kept.active);
    assert_eq!(kept.status, BookingStatus::Done);
    assert!(store.bookings.find_by_id(pending.id).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_configuration_is_not_found() {
    let store = Store::memory();
    let service = service(&store);

    assert_matches!(
        service.get(Uuid::new_v4(), Weekday::Monday).await.unwrap_err(),
        ScheduleError::NotFound(_)
    );
    assert_matches!(
        service.delete(Uuid::new_v4()).await.unwrap_err(),
        ScheduleError::NotFound(_)
    );
}
