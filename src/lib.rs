//! Offline-first survey storage and synchronization.
//!
//! Field workers capture property surveys into a local SQLite database while
//! offline and bulk-upload them once connectivity returns. This crate holds
//! the sequencing core: monotonic serial/property numbering across restarts,
//! pending/synced record state, work-assignment reconciliation (with its
//! destructive reset semantics), all-or-nothing batch upload, and
//! deletion-triggered renumbering of the trailing unsynced run.

pub mod error;
pub mod types;

pub mod allocator;
pub mod areas;
pub mod reconcile;
pub mod remote;
pub mod renumber;
pub mod service;
pub mod settings;
pub mod storage;
pub mod sync;
