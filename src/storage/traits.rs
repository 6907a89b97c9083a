//! Storage trait for the survey table.
//!
//! `SurveyStore` is the narrow I/O trait implemented by concrete stores
//! (SQLite in production, potentially others on other platforms). Components
//! are generic over it so tests can run against an in-memory database.

use crate::error::StorageError;
use crate::types::{Floor, FormData, SurveyRecord};

/// Scoped transactional operations over the survey table.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks.
pub trait SurveyStore: Send + Sync {
    /// Insert a new pending record. Atomic; assigns `createdAt` and returns
    /// the storage id.
    fn insert(&self, form: &FormData, floors: &[Floor]) -> Result<i64, StorageError>;

    /// Fetch a single record. A row whose payload fails to parse is a
    /// `Corruption` error here (listings skip such rows instead).
    fn get(&self, id: i64) -> Result<Option<SurveyRecord>, StorageError>;

    /// All records, newest first. Malformed rows are skipped with a warning.
    fn list_all(&self) -> Result<Vec<SurveyRecord>, StorageError>;

    /// Records with `isSynced = 0`, newest first.
    fn list_pending(&self) -> Result<Vec<SurveyRecord>, StorageError>;

    /// Unsynced records with id greater than `id`, ascending: the trailing
    /// run that deletion renumbering rewrites.
    fn pending_after(&self, id: i64) -> Result<Vec<SurveyRecord>, StorageError>;

    /// Flip `isSynced` to 1. Idempotent for already-synced rows.
    fn mark_synced(&self, id: i64) -> Result<(), StorageError>;

    /// Rewrite the form payload only. `floors` and `isSynced` are untouched.
    /// Used exclusively by deletion renumbering.
    fn update_form(&self, id: i64, form: &FormData) -> Result<(), StorageError>;

    fn delete_by_id(&self, id: i64) -> Result<(), StorageError>;

    /// Remove every record. Used only by the work-context purge path.
    fn delete_all(&self) -> Result<(), StorageError>;

    /// Execute a closure inside a storage transaction: commit on `Ok`, roll
    /// back on `Err`, on all exit paths.
    fn transaction<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Self) -> Result<T, StorageError>,
        Self: Sized;
}
