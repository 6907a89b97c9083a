//! Work-context reconciliation runs once at startup, before any survey can
//! be created.
//!
//! The work assignment is the scope of serial numbering, so a confirmed
//! assignment change forces a hard reset of all pending local state.
//! Already-synced history is server-durable and safe to discard. The purge is
//! destructive and only ever fires on decisions confirmed while online,
//! never speculatively from cached state.

use std::sync::Arc;

use crate::error::StorageError;
use crate::remote::RemoteApi;
use crate::settings::{keys, SettingsStore};
use crate::storage::SurveyStore;
use crate::types::ReconcileOutcome;

pub struct WorkReconciler<S: SurveyStore + SettingsStore> {
    store: Arc<S>,
    remote: Arc<dyn RemoteApi>,
}

impl<S: SurveyStore + SettingsStore> WorkReconciler<S> {
    pub fn new(store: Arc<S>, remote: Arc<dyn RemoteApi>) -> Self {
        Self { store, remote }
    }

    /// Reconcile the stored work id against the server's view for `user_id`.
    pub async fn reconcile(&self, user_id: &str) -> Result<ReconcileOutcome, StorageError> {
        let online = self.remote.is_reachable().await;

        let mut fetched: Option<String> = None;
        let mut fetched_spot: Option<String> = None;
        if online {
            match self.remote.fetch_work(user_id).await {
                Ok(lookup) => {
                    if lookup.nalla {
                        // No active assignment: wipe everything and leave the
                        // app unusable for entry until one exists.
                        tracing::debug!("work lookup returned nalla; clearing local state");
                        self.purge_all()?;
                        return Ok(ReconcileOutcome::AssignmentCleared);
                    }
                    if let Some(work) = lookup.work {
                        fetched_spot = work.spot.as_ref().and_then(|s| serde_json::to_string(s).ok());
                        fetched = Some(work.id);
                    }
                }
                Err(e) => {
                    // Expected while connectivity is flaky; fall back to the
                    // cached id rather than alerting.
                    tracing::debug!(error = %e, "work lookup failed; using cached work id");
                }
            }
        }

        let stored = self.store.get_item(keys::WORK_ID)?;

        let outcome = match (stored, fetched) {
            (None, Some(fetched)) => {
                self.store.set_item(keys::WORK_ID, &fetched)?;
                self.store.remove_item(keys::NEXT_SERIAL)?;
                ReconcileOutcome::FirstAssignment
            }
            (Some(stored), Some(fetched)) if stored != fetched => {
                tracing::debug!(%stored, %fetched, "work assignment changed; purging local data");
                self.purge_all()?;
                self.store.set_item(keys::WORK_ID, &fetched)?;
                ReconcileOutcome::WorkChanged
            }
            (Some(_), Some(_)) => ReconcileOutcome::Unchanged,
            (Some(_), None) => ReconcileOutcome::Unchanged,
            (None, None) => ReconcileOutcome::NoWorkId,
        };

        // The spot belongs to the fetched assignment, so it is written after
        // any purge triggered by the decision above.
        if let Some(spot) = &fetched_spot {
            self.store.set_item(keys::WORK_SPOT, spot)?;
        }

        Ok(outcome)
    }

    /// Delete every survey row and all per-assignment settings, atomically.
    fn purge_all(&self) -> Result<(), StorageError> {
        self.store.transaction(|s| {
            s.delete_all()?;
            s.remove_item(keys::WORK_ID)?;
            s.remove_item(keys::NEXT_SERIAL)?;
            s.remove_item(keys::CACHED_AREAS)?;
            s.remove_item(keys::WORK_SPOT)?;
            Ok(())
        })
    }
}
