//! Deletion with renumbering.
//!
//! Deleting a pending record frees its serial/property slot; every unsynced
//! record created after it shifts down by one so the sequence stays
//! contiguous, and the allocator cursor lands one past the last number.
//! Synced records are frozen and never rewritten.

use crate::error::StorageError;
use crate::settings::{keys, SettingsStore};
use crate::storage::SurveyStore;
use crate::types::SurveyRecord;

/// Delete `record` and renumber the trailing unsynced run, in one
/// transaction.
///
/// After this returns, unsynced serial numbers form a gap-free ascending run
/// and `NEXT_SERIAL` equals one past the last of them. Deleting the
/// highest-numbered record reclaims its own slot directly.
pub fn delete_record<S>(store: &S, record: &SurveyRecord) -> Result<(), StorageError>
where
    S: SurveyStore + SettingsStore,
{
    if record.is_synced {
        return Err(StorageError::AlreadySynced(record.id));
    }

    store.transaction(|s| {
        s.delete_by_id(record.id)?;

        // Records created after the deleted one, oldest first. The two
        // counters run independently even though they currently move in
        // lockstep.
        let mut serial = record.form.serial_number;
        let mut property = record.form.property_number;
        for row in s.pending_after(record.id)? {
            let mut form = row.form;
            form.serial_number = serial;
            form.property_number = property;
            s.update_form(row.id, &form)?;
            serial += 1;
            property += 1;
        }

        s.set_item(keys::NEXT_SERIAL, &serial.to_string())?;
        Ok(())
    })
}
