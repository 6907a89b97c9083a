//! Sequence allocator: produces the next serial/property number.
//!
//! The persisted `NEXT_SERIAL` cursor is the source of truth. It is only
//! computed from the remote index when missing (first use in a new work
//! context), and only advanced after a successful save.

use std::sync::Arc;

use crate::error::{SequenceError, StorageError};
use crate::remote::RemoteApi;
use crate::settings::{keys, SettingsStore};

pub struct SequenceAllocator<S: SettingsStore> {
    settings: Arc<S>,
    remote: Arc<dyn RemoteApi>,
}

impl<S: SettingsStore> SequenceAllocator<S> {
    pub fn new(settings: Arc<S>, remote: Arc<dyn RemoteApi>) -> Self {
        Self { settings, remote }
    }

    /// The number the next new record should use.
    ///
    /// Returns the cached cursor as-is when present (the increment happens on
    /// save, not here). Otherwise sources `last remote serial + 1` from the
    /// server and persists it. An empty remote sheet is treated the same as
    /// being offline: there is nothing to index against, so record creation
    /// stays blocked until resolved manually.
    pub async fn next_number(&self) -> Result<u64, SequenceError> {
        if let Some(stored) = self.settings.get_item(keys::NEXT_SERIAL)? {
            return stored
                .trim()
                .parse()
                .map_err(|_| SequenceError::BadCursor(stored));
        }

        if self.remote.is_reachable().await {
            match self.remote.fetch_last_serial().await {
                Ok(Some(last)) => {
                    let next = last + 1;
                    self.settings.set_item(keys::NEXT_SERIAL, &next.to_string())?;
                    return Ok(next);
                }
                Ok(None) => {
                    tracing::warn!("remote sheet is empty; no serial to index against");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "remote index fetch failed");
                }
            }
        }

        Err(SequenceError::NoConnectivityNoCache)
    }

    /// Persist the cursor as one past a just-saved serial, then read it back
    /// so the returned value is what storage actually holds. A missing
    /// read-back means the write was lost and is an error, not a guess.
    pub fn advance_past(&self, serial: u64) -> Result<u64, SequenceError> {
        self.settings
            .set_item(keys::NEXT_SERIAL, &(serial + 1).to_string())?;
        let stored = self
            .settings
            .get_item(keys::NEXT_SERIAL)?
            .ok_or_else(|| StorageError::Transaction {
                message: "serial cursor missing after write".to_string(),
                source: None,
            })?;
        stored
            .trim()
            .parse()
            .map_err(|_| SequenceError::BadCursor(stored))
    }

    /// Clear the cursor so the next allocation recomputes it from remote.
    pub fn reset(&self) -> Result<(), SequenceError> {
        self.settings.remove_item(keys::NEXT_SERIAL)?;
        Ok(())
    }
}
