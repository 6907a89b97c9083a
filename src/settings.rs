//! Persisted scalar settings.
//!
//! The original app kept these in device key-value storage; here they are an
//! explicit injected dependency so every component can be tested against an
//! in-memory store.

use crate::error::StorageError;

/// Well-known settings keys.
pub mod keys {
    /// Remote-assigned id of the current work assignment.
    pub const WORK_ID: &str = "WORK_ID";
    /// Text-encoded `u64` cursor for the sequence allocator.
    pub const NEXT_SERIAL: &str = "NEXT_SERIAL";
    /// JSON array of cached `Area` entries.
    pub const CACHED_AREAS: &str = "cached_areas";
    /// JSON `WorkSpot` for the current assignment.
    pub const WORK_SPOT: &str = "workSpot";
}

/// Scalar key-value settings store.
///
/// Implementors must be `Send + Sync` so components can share them.
pub trait SettingsStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
