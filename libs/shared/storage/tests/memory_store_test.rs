use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use shared_models::{Booking, BookingStatus, Slot, Weekday, WeeklyConfig};
use shared_storage::{Store, StorageError};

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn config_for(clinician_id: Uuid, weekday: Weekday) -> WeeklyConfig {
    WeeklyConfig {
        id: Uuid::new_v4(),
        clinician_id,
        weekday,
        work_start: time(8, 0),
        work_end: time(18, 0),
        break_start: None,
        break_end: None,
        step_minutes: 60,
        active: true,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn booking_for(
    clinician_id: Uuid,
    patient_id: Uuid,
    series_id: Uuid,
    sequence: i32,
    date: NaiveDate,
) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        patient_id,
        clinician_id,
        slot_id: None,
        series_id,
        sequence,
        date,
        start: time(9, 0),
        end: time(9, 50),
        status: BookingStatus::Scheduled,
        active: true,
        notes: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

#[tokio::test]
async fn config_lookup_is_scoped_to_clinician_and_weekday() {
    let store = Store::memory();
    let clinician = Uuid::new_v4();
    let other = Uuid::new_v4();

    store
        .configs
        .insert(config_for(clinician, Weekday::Monday))
        .await
        .unwrap();
    store
        .configs
        .insert(config_for(other, Weekday::Monday))
        .await
        .unwrap();

    let found = store
        .configs
        .find_active(clinician, Weekday::Monday)
        .await
        .unwrap();
    assert_eq!(found.unwrap().clinician_id, clinician);

    let missing = store
        .configs
        .find_active(clinician, Weekday::Tuesday)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn inactive_configs_are_invisible_to_active_lookups() {
    let store = Store::memory();
    let clinician = Uuid::new_v4();
    let mut cfg = config_for(clinician, Weekday::Friday);
    cfg.active = false;
    store.configs.insert(cfg).await.unwrap();

    assert!(store
        .configs
        .find_active(clinician, Weekday::Friday)
        .await
        .unwrap()
        .is_none());
    assert!(store
        .configs
        .find_active_by_clinician(clinician)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn clinician_configs_come_back_ordered_by_weekday() {
    let store = Store::memory();
    let clinician = Uuid::new_v4();
    for weekday in [Weekday::Friday, Weekday::Monday, Weekday::Wednesday] {
        store
            .configs
            .insert(config_for(clinician, weekday))
            .await
            .unwrap();
    }

    let configs = store
        .configs
        .find_active_by_clinician(clinician)
        .await
        .unwrap();
    let days: Vec<_> = configs.iter().map(|c| c.weekday).collect();
    assert_eq!(days, vec![Weekday::Monday, Weekday::Wednesday, Weekday::Friday]);
}

#[tokio::test]
async fn updating_unknown_row_reports_not_found() {
    let store = Store::memory();
    let cfg = config_for(Uuid::new_v4(), Weekday::Monday);

    let err = store.configs.update(&cfg).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn slot_deletion_cascades_from_config() {
    let store = Store::memory();
    let clinician = Uuid::new_v4();
    let config_id = Uuid::new_v4();
    let other_config = Uuid::new_v4();

    let slot = |cfg: Uuid, h: u32| Slot {
        id: Uuid::new_v4(),
        config_id: cfg,
        clinician_id: clinician,
        weekday: Weekday::Monday,
        start: time(h, 0),
        end: time(h, 50),
        active: true,
        patient_id: None,
    };
    store
        .slots
        .insert_batch(vec![slot(config_id, 8), slot(config_id, 9), slot(other_config, 10)])
        .await
        .unwrap();

    store.slots.delete_by_config(config_id).await.unwrap();

    assert!(store.slots.find_by_config(config_id).await.unwrap().is_empty());
    assert_eq!(store.slots.find_by_config(other_config).await.unwrap().len(), 1);
}

#[tokio::test]
async fn slots_come_back_ordered_by_start() {
    let store = Store::memory();
    let clinician = Uuid::new_v4();
    let config_id = Uuid::new_v4();
    let slot = |h: u32| Slot {
        id: Uuid::new_v4(),
        config_id,
        clinician_id: clinician,
        weekday: Weekday::Tuesday,
        start: time(h, 0),
        end: time(h, 50),
        active: true,
        patient_id: None,
    };
    store
        .slots
        .insert_batch(vec![slot(14), slot(8), slot(11)])
        .await
        .unwrap();

    let slots = store
        .slots
        .find_by_clinician_weekday(clinician, Weekday::Tuesday)
        .await
        .unwrap();
    let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
    assert_eq!(starts, vec![time(8, 0), time(11, 0), time(14, 0)]);
}

#[tokio::test]
async fn scheduled_on_date_filters_status_and_activity() {
    let store = Store::memory();
    let clinician = Uuid::new_v4();
    let patient = Uuid::new_v4();
    let series = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();

    let scheduled = booking_for(clinician, patient, series, 1, date);
    let mut done = booking_for(clinician, patient, series, 2, date);
    done.status = BookingStatus::Done;
    let mut inactive = booking_for(clinician, patient, series, 3, date);
    inactive.active = false;
    let elsewhere = booking_for(
        clinician,
        patient,
        series,
        4,
        NaiveDate::from_ymd_opt(2026, 9, 7).unwrap(),
    );

    for b in [scheduled.clone(), done, inactive, elsewhere] {
        store.bookings.insert(b).await.unwrap();
    }

    let found = store
        .bookings
        .find_scheduled_on_date(clinician, date)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, scheduled.id);

    // The count ignores status and activity, it sees everything stored.
    assert_eq!(store.bookings.count_for_clinician(clinician).await.unwrap(), 4);
}

#[tokio::test]
async fn series_lookup_orders_by_date() {
    let store = Store::memory();
    let clinician = Uuid::new_v4();
    let patient = Uuid::new_v4();
    let series = Uuid::new_v4();
    let d = |day: u32| NaiveDate::from_ymd_opt(2026, 9, day).unwrap();

    for (seq, day) in [(3, 21), (1, 7), (2, 14)] {
        store
            .bookings
            .insert(booking_for(clinician, patient, series, seq, d(day)))
            .await
            .unwrap();
    }

    let found = store.bookings.find_by_series(series).await.unwrap();
    let sequences: Vec<_> = found.iter().map(|b| b.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[tokio::test]
async fn batch_delete_removes_only_named_rows() {
    let store = Store::memory();
    let clinician = Uuid::new_v4();
    let patient = Uuid::new_v4();
    let series = Uuid::new_v4();
    let d = |day: u32| NaiveDate::from_ymd_opt(2026, 9, day).unwrap();

    let keep = booking_for(clinician, patient, series, 1, d(7));
    let drop_a = booking_for(clinician, patient, series, 2, d(14));
    let drop_b = booking_for(clinician, patient, series, 3, d(21));
    for b in [keep.clone(), drop_a.clone(), drop_b.clone()] {
        store.bookings.insert(b).await.unwrap();
    }

    store
        .bookings
        .delete_batch(&[drop_a.id, drop_b.id])
        .await
        .unwrap();

    let remaining = store.bookings.find_by_series(series).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);
}

#[tokio::test]
async fn patient_history_can_include_soft_deleted_rows() {
    let store = Store::memory();
    let clinician = Uuid::new_v4();
    let patient = Uuid::new_v4();
    let series = Uuid::new_v4();
    let d = |day: u32| NaiveDate::from_ymd_opt(2026, 9, day).unwrap();

    let mut done = booking_for(clinician, patient, series, 1, d(7));
    done.status = BookingStatus::Done;
    done.active = false;
    let live = booking_for(clinician, patient, series, 2, d(14));
    store.bookings.insert(done).await.unwrap();
    store.bookings.insert(live).await.unwrap();

    assert_eq!(store.bookings.find_by_patient(patient, true).await.unwrap().len(), 1);
    assert_eq!(store.bookings.find_by_patient(patient, false).await.unwrap().len(), 2);
}
