//! SQLite store for survey records and settings.
//!
//! The connection is protected by a `parking_lot::ReentrantMutex<RefCell<..>>`
//! so that `transaction()` can hold the lock while calling the closure, which
//! also needs to lock in order to execute SQL. Columns keep the original
//! app's names (`formData`, `floors`, `isSynced`, `createdAt`) so a database
//! migrated from the device stays readable.

use std::cell::{Cell, RefCell};

use parking_lot::ReentrantMutex;
use rusqlite::params;

use crate::error::StorageError;
use crate::settings::SettingsStore;
use crate::types::{Floor, FormData, SurveyRecord};

use super::traits::SurveyStore;

const SELECT_COLS: &str = "SELECT id, formData, floors, isSynced, createdAt FROM surveys";

/// Raw row before JSON parsing.
struct RawRow {
    id: i64,
    form_data: String,
    floors: String,
    is_synced: bool,
    created_at: String,
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        form_data: row.get(1)?,
        floors: row.get(2)?,
        is_synced: row.get::<_, i64>(3)? != 0,
        created_at: row.get(4)?,
    })
}

impl RawRow {
    /// Parse the serialized payload columns. Fails with `Corruption` naming
    /// the offending column.
    fn parse(self) -> Result<SurveyRecord, StorageError> {
        let form: FormData =
            serde_json::from_str(&self.form_data).map_err(|e| StorageError::Corruption {
                id: self.id,
                field: "formData",
                source: e,
            })?;
        let floors: Vec<Floor> =
            serde_json::from_str(&self.floors).map_err(|e| StorageError::Corruption {
                id: self.id,
                field: "floors",
                source: e,
            })?;
        Ok(SurveyRecord {
            id: self.id,
            form,
            floors,
            is_synced: self.is_synced,
            created_at: self.created_at,
        })
    }
}

// ============================================================================
// SqliteStore
// ============================================================================

/// SQLite-backed implementation of `SurveyStore` and `SettingsStore`.
pub struct SqliteStore {
    conn: ReentrantMutex<RefCell<rusqlite::Connection>>,
    initialized: bool,
}

impl SqliteStore {
    /// Open a file-backed database.
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = rusqlite::Connection::open(path)?;
        Ok(Self {
            conn: ReentrantMutex::new(RefCell::new(conn)),
            initialized: false,
        })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self {
            conn: ReentrantMutex::new(RefCell::new(conn)),
            initialized: false,
        })
    }

    /// Create tables and set pragmas.
    pub fn initialize(&mut self) -> Result<(), StorageError> {
        {
            let guard = self.conn.lock();
            let conn = guard.borrow();

            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA busy_timeout=5000;",
            )?;

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS surveys (
                    id        INTEGER PRIMARY KEY AUTOINCREMENT,
                    formData  TEXT NOT NULL,
                    floors    TEXT NOT NULL DEFAULT '[]',
                    isSynced  INTEGER NOT NULL DEFAULT 0,
                    createdAt TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_surveys_pending
                    ON surveys(isSynced);
                CREATE TABLE IF NOT EXISTS settings (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )?;
        }

        self.initialized = true;
        Ok(())
    }

    /// Returns whether `initialize()` has been called.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Execute `f` with a shared reference to the underlying connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T>,
    {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        f(&conn).map_err(StorageError::Sqlite)
    }

    /// Run a query returning survey rows and parse them, skipping (with a
    /// warning) any row whose payload columns fail to parse.
    fn query_records(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<SurveyRecord>, StorageError> {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, row_to_raw)?;

        let mut records = Vec::new();
        for raw in rows {
            match raw?.parse() {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable survey row");
                }
            }
        }
        Ok(records)
    }
}

// ============================================================================
// SurveyStore implementation
// ============================================================================

impl SurveyStore for SqliteStore {
    fn insert(&self, form: &FormData, floors: &[Floor]) -> Result<i64, StorageError> {
        let form_str = serde_json::to_string(form).map_err(|e| StorageError::Transaction {
            message: "serialize formData".to_string(),
            source: Some(Box::new(e)),
        })?;
        let floors_str = serde_json::to_string(floors).map_err(|e| StorageError::Transaction {
            message: "serialize floors".to_string(),
            source: Some(Box::new(e)),
        })?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO surveys (formData, floors, isSynced, createdAt) \
                 VALUES (?1, ?2, 0, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
                params![form_str, floors_str],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn get(&self, id: i64) -> Result<Option<SurveyRecord>, StorageError> {
        let raw = {
            let guard = self.conn.lock();
            let conn = guard.borrow();
            let mut stmt =
                conn.prepare_cached(&format!("{SELECT_COLS} WHERE id = ?1"))?;
            match stmt.query_row(params![id], row_to_raw) {
                Ok(raw) => Some(raw),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(StorageError::Sqlite(e)),
            }
        };
        raw.map(RawRow::parse).transpose()
    }

    fn list_all(&self) -> Result<Vec<SurveyRecord>, StorageError> {
        self.query_records(&format!("{SELECT_COLS} ORDER BY id DESC"), &[])
    }

    fn list_pending(&self) -> Result<Vec<SurveyRecord>, StorageError> {
        self.query_records(
            &format!("{SELECT_COLS} WHERE isSynced = 0 ORDER BY id DESC"),
            &[],
        )
    }

    fn pending_after(&self, id: i64) -> Result<Vec<SurveyRecord>, StorageError> {
        self.query_records(
            &format!("{SELECT_COLS} WHERE isSynced = 0 AND id > ?1 ORDER BY id ASC"),
            &[&id],
        )
    }

    fn mark_synced(&self, id: i64) -> Result<(), StorageError> {
        let changed = self.with_conn(|conn| {
            conn.execute("UPDATE surveys SET isSynced = 1 WHERE id = ?1", params![id])
        })?;
        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    fn update_form(&self, id: i64, form: &FormData) -> Result<(), StorageError> {
        let form_str = serde_json::to_string(form).map_err(|e| StorageError::Transaction {
            message: "serialize formData".to_string(),
            source: Some(Box::new(e)),
        })?;
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE surveys SET formData = ?2 WHERE id = ?1",
                params![id, form_str],
            )
        })?;
        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    fn delete_by_id(&self, id: i64) -> Result<(), StorageError> {
        let changed = self
            .with_conn(|conn| conn.execute("DELETE FROM surveys WHERE id = ?1", params![id]))?;
        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    fn delete_all(&self) -> Result<(), StorageError> {
        self.with_conn(|conn| conn.execute("DELETE FROM surveys", []).map(|_| ()))
    }

    fn transaction<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Self) -> Result<T, StorageError>,
    {
        // SAVEPOINTs compose with outer transactions; each invocation gets a
        // unique name to avoid collisions when nested. The ReentrantMutex
        // lets the closure re-acquire the lock for its SQL calls.
        thread_local! {
            static SP_COUNTER: Cell<u64> = const { Cell::new(0) };
        }
        let sp_name = SP_COUNTER.with(|c| {
            let n = c.get();
            c.set(n + 1);
            format!("sp_{n}")
        });

        {
            let guard = self.conn.lock();
            guard
                .borrow()
                .execute(&format!("SAVEPOINT {sp_name}"), [])?;
        }

        match f(self) {
            Ok(v) => {
                let guard = self.conn.lock();
                let release_ok = guard
                    .borrow()
                    .execute(&format!("RELEASE SAVEPOINT {sp_name}"), [])
                    .is_ok();
                drop(guard);
                if release_ok {
                    Ok(v)
                } else {
                    // Best-effort rollback to clean up the leaked savepoint
                    let guard = self.conn.lock();
                    let _ = guard
                        .borrow()
                        .execute(&format!("ROLLBACK TO SAVEPOINT {sp_name}"), []);
                    Err(StorageError::Transaction {
                        message: "RELEASE SAVEPOINT failed".to_string(),
                        source: None,
                    })
                }
            }
            Err(e) => {
                let guard = self.conn.lock();
                let _ = guard
                    .borrow()
                    .execute(&format!("ROLLBACK TO SAVEPOINT {sp_name}"), []);
                Err(e)
            }
        }
    }
}

// ============================================================================
// SettingsStore implementation
// ============================================================================

impl SettingsStore for SqliteStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        let mut stmt = conn.prepare_cached("SELECT value FROM settings WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Sqlite(e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map(|_| ())
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM settings WHERE key = ?1", params![key])
                .map(|_| ())
        })
    }
}
