//! Shared test harness: in-memory store constructor and a scriptable
//! `RemoteApi` fake.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use survey_sync::error::RemoteError;
use survey_sync::remote::RemoteApi;
use survey_sync::storage::{SqliteStore, SurveyStore};
use survey_sync::types::{Area, Floor, FormData, RoomDetail, SyncBatch, WorkLookup};

/// Build an initialized in-memory `SqliteStore`.
pub fn make_store() -> Arc<SqliteStore> {
    let mut store = SqliteStore::open_in_memory().expect("open in-memory DB");
    store.initialize().expect("initialize");
    Arc::new(store)
}

/// A minimal valid form with lockstep serial/property numbers.
pub fn make_form(serial: u64) -> FormData {
    FormData {
        serial_number: serial,
        property_number: serial,
        owner_name: format!("Owner {serial}"),
        area_name: "Ward 3".to_string(),
        ..Default::default()
    }
}

/// A single ground floor with one pucca room.
pub fn make_floors() -> Vec<Floor> {
    vec![Floor {
        floor_type: "ગ્રાઉન્ડ ફ્લોર".to_string(),
        room_details: vec![RoomDetail {
            kind: "પાકા".to_string(),
            room_hall_shop_godown: "રૂમ".to_string(),
            slab_rooms: 1,
            ..Default::default()
        }],
    }]
}

/// Insert a pending record with the given serial, returning its storage id.
pub fn save_pending(store: &SqliteStore, serial: u64) -> i64 {
    store
        .insert(&make_form(serial), &make_floors())
        .expect("insert")
}

// ============================================================================
// MockRemote
// ============================================================================

/// Scriptable `RemoteApi` fake. All knobs use interior mutability so a test
/// can keep its own `Arc` and flip behavior mid-flow.
pub struct MockRemote {
    reachable: AtomicBool,
    work: Mutex<Option<WorkLookup>>,
    work_fails: AtomicBool,
    last_serial: Mutex<Option<u64>>,
    sheet_fails: AtomicBool,
    push_fails: AtomicBool,
    /// Recorded upload batches.
    pub pushes: Mutex<Vec<SyncBatch>>,
    server_areas: Mutex<Vec<Area>>,
    area_push_fails: AtomicBool,
    area_fetch_fails: AtomicBool,
    /// Recorded area names pushed.
    pub area_pushes: Mutex<Vec<String>>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reachable: AtomicBool::new(true),
            work: Mutex::new(None),
            work_fails: AtomicBool::new(false),
            last_serial: Mutex::new(None),
            sheet_fails: AtomicBool::new(false),
            push_fails: AtomicBool::new(false),
            pushes: Mutex::new(Vec::new()),
            server_areas: Mutex::new(Vec::new()),
            area_push_fails: AtomicBool::new(false),
            area_fetch_fails: AtomicBool::new(false),
            area_pushes: Mutex::new(Vec::new()),
        })
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_work(&self, work_id: &str) {
        *self.work.lock().unwrap() = Some(WorkLookup {
            work: Some(survey_sync::types::WorkAssignment {
                id: work_id.to_string(),
                spot: None,
            }),
            nalla: false,
        });
    }

    pub fn set_work_lookup(&self, lookup: WorkLookup) {
        *self.work.lock().unwrap() = Some(lookup);
    }

    pub fn set_work_fails(&self, fails: bool) {
        self.work_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_last_serial(&self, serial: Option<u64>) {
        *self.last_serial.lock().unwrap() = serial;
    }

    pub fn set_sheet_fails(&self, fails: bool) {
        self.sheet_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_push_fails(&self, fails: bool) {
        self.push_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_server_areas(&self, areas: Vec<Area>) {
        *self.server_areas.lock().unwrap() = areas;
    }

    pub fn set_area_push_fails(&self, fails: bool) {
        self.area_push_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_area_fetch_fails(&self, fails: bool) {
        self.area_fetch_fails.store(fails, Ordering::SeqCst);
    }

    pub fn push_count(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteApi for MockRemote {
    async fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    async fn fetch_work(&self, _user_id: &str) -> Result<WorkLookup, RemoteError> {
        if self.work_fails.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("work lookup failed".to_string()));
        }
        self.work
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| RemoteError::Transport("no work response scripted".to_string()))
    }

    async fn fetch_last_serial(&self) -> Result<Option<u64>, RemoteError> {
        if self.sheet_fails.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("sheet fetch failed".to_string()));
        }
        Ok(*self.last_serial.lock().unwrap())
    }

    async fn push_surveys(&self, batch: &SyncBatch) -> Result<(), RemoteError> {
        if self.push_fails.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected {
                status: 500,
                message: "server returned error".to_string(),
            });
        }
        self.pushes.lock().unwrap().push(batch.clone());
        Ok(())
    }

    async fn push_area(&self, name: &str) -> Result<Option<Area>, RemoteError> {
        if self.area_push_fails.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected {
                status: 500,
                message: "area rejected".to_string(),
            });
        }
        self.area_pushes.lock().unwrap().push(name.to_string());
        Ok(None)
    }

    async fn fetch_areas(&self) -> Result<Vec<Area>, RemoteError> {
        if self.area_fetch_fails.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("areas fetch failed".to_string()));
        }
        Ok(self.server_areas.lock().unwrap().clone())
    }
}
