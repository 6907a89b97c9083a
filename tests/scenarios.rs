//! End-to-end flows through `SurveyService`: startup, numbered saves,
//! deletion, sync retries, and the offline area cache.

mod common;

use std::sync::Arc;

use common::{make_floors, make_form, make_store, MockRemote};
use survey_sync::error::SurveyError;
use survey_sync::remote::RemoteApi;
use survey_sync::service::SurveyService;
use survey_sync::settings::{keys, SettingsStore};
use survey_sync::storage::SurveyStore;
use survey_sync::types::{Area, FormData, ReconcileOutcome};

// ============================================================================
// startup + contiguous numbering
// ============================================================================

#[tokio::test]
async fn fresh_start_produces_a_contiguous_run_from_the_remote_index() {
    let store = make_store();
    let remote = MockRemote::new();
    remote.set_work("w-1");
    remote.set_last_serial(Some(41));

    let service = SurveyService::new(Arc::clone(&store), remote);
    let outcome = service.startup("user-1").await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::FirstAssignment);

    for expected in 42..45 {
        let serial = service.next_number().await.unwrap();
        assert_eq!(serial, expected);
        let saved = service.save(&make_form(serial), &make_floors()).unwrap();
        assert_eq!(saved.next_serial, serial + 1);
    }

    let mut records = service.list().unwrap();
    records.sort_by_key(|r| r.id);
    let serials: Vec<u64> = records.iter().map(|r| r.form.serial_number).collect();
    assert_eq!(serials, vec![42, 43, 44]);
}

#[tokio::test]
async fn save_advances_the_cursor_past_the_saved_serial() {
    let store = make_store();
    let remote = MockRemote::new();
    store.set_item(keys::NEXT_SERIAL, "42").unwrap();

    let service = SurveyService::new(Arc::clone(&store), remote);
    let saved = service.save(&make_form(42), &make_floors()).unwrap();

    assert_eq!(saved.next_serial, 43);
    assert_eq!(service.next_number().await.unwrap(), 43);
}

#[tokio::test]
async fn delete_then_save_keeps_the_sequence_contiguous() {
    let store = make_store();
    let remote = MockRemote::new();
    store.set_item(keys::NEXT_SERIAL, "10").unwrap();
    store.set_item(keys::WORK_ID, "w-1").unwrap();

    let service = SurveyService::new(Arc::clone(&store), remote);
    service.save(&make_form(10), &make_floors()).unwrap();
    let middle = service.save(&make_form(11), &make_floors()).unwrap();
    service.save(&make_form(12), &make_floors()).unwrap();

    let record = store.get(middle.id).unwrap().unwrap();
    service.delete(&record).unwrap();

    // The freed slot was reclaimed, so the next save continues at 12.
    assert_eq!(service.next_number().await.unwrap(), 12);
    service.save(&make_form(12), &make_floors()).unwrap();

    let mut records = service.list().unwrap();
    records.sort_by_key(|r| r.form.serial_number);
    let serials: Vec<u64> = records.iter().map(|r| r.form.serial_number).collect();
    assert_eq!(serials, vec![10, 11, 12]);
}

// ============================================================================
// sync retry
// ============================================================================

#[tokio::test]
async fn failed_sync_keeps_records_pending_until_a_retry_succeeds() {
    let store = make_store();
    let remote = MockRemote::new();
    remote.set_push_fails(true);
    store.set_item(keys::WORK_ID, "w-1").unwrap();
    store.set_item(keys::NEXT_SERIAL, "1").unwrap();

    let service = SurveyService::new(Arc::clone(&store), remote.clone() as Arc<dyn RemoteApi>);
    service.save(&make_form(1), &make_floors()).unwrap();
    service.save(&make_form(2), &make_floors()).unwrap();

    assert!(service.sync().await.is_err());
    assert_eq!(store.list_pending().unwrap().len(), 2);

    remote.set_push_fails(false);
    let result = service.sync().await.unwrap();
    assert_eq!(result.uploaded, 2);
    assert!(store.list_pending().unwrap().is_empty());
}

// ============================================================================
// validation
// ============================================================================

#[tokio::test]
async fn save_rejects_forms_missing_required_fields() {
    let store = make_store();
    let remote = MockRemote::new();
    let service = SurveyService::new(Arc::clone(&store), remote);

    let no_owner = FormData {
        serial_number: 1,
        property_number: 1,
        area_name: "Ward 3".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        service.save(&no_owner, &[]).unwrap_err(),
        SurveyError::Validation(_)
    ));

    let no_area = FormData {
        serial_number: 1,
        property_number: 1,
        owner_name: "Owner".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        service.save(&no_area, &[]).unwrap_err(),
        SurveyError::Validation(_)
    ));

    // Nothing persisted, cursor untouched.
    assert!(store.list_all().unwrap().is_empty());
    assert!(store.get_item(keys::NEXT_SERIAL).unwrap().is_none());
}

// ============================================================================
// area cache
// ============================================================================

#[tokio::test]
async fn offline_area_add_is_cached_and_pushed_on_refresh() {
    let store = make_store();
    let remote = MockRemote::new();
    remote.set_reachable(false);

    let service = SurveyService::new(Arc::clone(&store), remote.clone() as Arc<dyn RemoteApi>);
    let area = service.areas().add("Nava Para").await.unwrap();
    assert!(!area.is_synced);

    let cached = service.areas().load().unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].name, "Nava Para");

    // Back online: refresh pushes the pending area and takes the server list.
    remote.set_reachable(true);
    remote.set_server_areas(vec![Area {
        id: 7,
        name: "Nava Para".to_string(),
        is_synced: false,
    }]);
    let refreshed = service.areas().refresh().await.unwrap();

    assert_eq!(remote.area_pushes.lock().unwrap().as_slice(), ["Nava Para"]);
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].id, 7);
    assert!(refreshed[0].is_synced);
}

#[tokio::test]
async fn online_area_add_is_pushed_immediately() {
    let store = make_store();
    let remote = MockRemote::new();

    let service = SurveyService::new(Arc::clone(&store), remote.clone() as Arc<dyn RemoteApi>);
    let area = service.areas().add("  Station Road ").await.unwrap();

    assert!(area.is_synced);
    assert_eq!(area.name, "Station Road");
    assert_eq!(
        remote.area_pushes.lock().unwrap().as_slice(),
        ["Station Road"]
    );
}
