//! Composition root wiring the store and remote into the app-facing flows:
//! startup reconciliation, numbered save, deletion, and sync.

use std::sync::Arc;

use crate::allocator::SequenceAllocator;
use crate::areas::AreaCache;
use crate::error::{Result, SequenceError, SurveyError, SyncError};
use crate::reconcile::WorkReconciler;
use crate::remote::RemoteApi;
use crate::renumber;
use crate::settings::SettingsStore;
use crate::storage::SurveyStore;
use crate::sync::SyncEngine;
use crate::types::{Floor, FormData, ReconcileOutcome, SurveyRecord, SyncResult};

/// Result of a successful save: the storage id and the number the next form
/// should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedSurvey {
    pub id: i64,
    pub next_serial: u64,
}

pub struct SurveyService<S: SurveyStore + SettingsStore + 'static> {
    store: Arc<S>,
    allocator: SequenceAllocator<S>,
    reconciler: WorkReconciler<S>,
    engine: SyncEngine<S>,
    areas: AreaCache<S>,
}

impl<S: SurveyStore + SettingsStore + 'static> SurveyService<S> {
    pub fn new(store: Arc<S>, remote: Arc<dyn RemoteApi>) -> Self {
        Self {
            allocator: SequenceAllocator::new(Arc::clone(&store), Arc::clone(&remote)),
            reconciler: WorkReconciler::new(Arc::clone(&store), Arc::clone(&remote)),
            engine: SyncEngine::new(Arc::clone(&store), Arc::clone(&remote)),
            areas: AreaCache::new(Arc::clone(&store), remote),
            store,
        }
    }

    /// Startup flow: reconcile the work context first; this may wipe local
    /// state and reset the allocator before any number is handed out.
    pub async fn startup(&self, user_id: &str) -> Result<ReconcileOutcome> {
        Ok(self.reconciler.reconcile(user_id).await?)
    }

    /// The serial/property number the next form should be pre-filled with.
    pub async fn next_number(&self) -> Result<u64, SequenceError> {
        self.allocator.next_number().await
    }

    /// Validate and persist a new pending record, then advance the cursor
    /// past its serial (read-after-write).
    pub fn save(&self, form: &FormData, floors: &[Floor]) -> Result<SavedSurvey> {
        form.validate().map_err(SurveyError::Validation)?;

        let id = self.store.insert(form, floors)?;
        let next_serial = self.allocator.advance_past(form.serial_number)?;
        Ok(SavedSurvey { id, next_serial })
    }

    /// Delete a pending record and renumber the trailing unsynced run.
    pub fn delete(&self, record: &SurveyRecord) -> Result<()> {
        renumber::delete_record(self.store.as_ref(), record)?;
        Ok(())
    }

    /// Upload all pending records as one batch.
    pub async fn sync(&self) -> Result<SyncResult, SyncError> {
        self.engine.sync().await
    }

    /// All records, newest first.
    pub fn list(&self) -> Result<Vec<SurveyRecord>> {
        Ok(self.store.list_all()?)
    }

    pub fn areas(&self) -> &AreaCache<S> {
        &self.areas
    }
}
