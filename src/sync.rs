//! Batch upload of pending records.
//!
//! Success is all-or-nothing per batch: records flip to synced in one
//! storage transaction only after the server confirms acceptance. There is
//! no automatic retry; the operation is user-initiated and safe to
//! re-invoke, since rejected records simply stay pending.

use std::sync::Arc;

use crate::error::SyncError;
use crate::remote::RemoteApi;
use crate::settings::{keys, SettingsStore};
use crate::storage::SurveyStore;
use crate::types::{SurveyUpload, SyncBatch, SyncResult};

pub struct SyncEngine<S: SurveyStore + SettingsStore> {
    store: Arc<S>,
    remote: Arc<dyn RemoteApi>,
}

impl<S: SurveyStore + SettingsStore> SyncEngine<S> {
    pub fn new(store: Arc<S>, remote: Arc<dyn RemoteApi>) -> Self {
        Self { store, remote }
    }

    /// Upload every pending record as one batch.
    pub async fn sync(&self) -> Result<SyncResult, SyncError> {
        // Uploading under an undefined work scope must never happen, so this
        // check precedes any network traffic.
        let work_id = self
            .store
            .get_item(keys::WORK_ID)?
            .ok_or(SyncError::ConfigurationMissing)?;

        if !self.remote.is_reachable().await {
            return Err(SyncError::NoConnectivity);
        }

        let mut pending = self.store.list_pending()?;
        // The server must receive records in creation order regardless of the
        // newest-first storage ordering.
        pending.sort_by_key(|r| r.form.serial_number);

        if pending.is_empty() {
            return Ok(SyncResult { uploaded: 0 });
        }

        let batch = SyncBatch {
            payload: pending
                .iter()
                .map(|r| SurveyUpload {
                    form: r.form.clone(),
                    floors: r.floors.clone(),
                })
                .collect(),
            work_id,
        };

        self.remote.push_surveys(&batch).await?;

        // Confirmed accepted: flip the whole batch in one transaction.
        self.store.transaction(|s| {
            for record in &pending {
                s.mark_synced(record.id)?;
            }
            Ok(())
        })?;

        tracing::debug!(uploaded = pending.len(), "sync batch accepted");
        Ok(SyncResult {
            uploaded: pending.len(),
        })
    }
}
