//! Remote server interface.
//!
//! The network layer sits behind an object-safe async trait so the core
//! flows can be exercised against a fake. `http::HttpRemote` is the
//! production implementation.

pub mod http;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::types::{Area, SyncBatch, WorkLookup};

pub use http::HttpRemote;

/// Server contract consumed by the sequencing core.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Cheap connectivity probe. `false` means every other call would fail;
    /// callers use this to fail fast and to gate destructive decisions.
    async fn is_reachable(&self) -> bool;

    /// `GET /work/{userId}`: current assignment lookup.
    async fn fetch_work(&self, user_id: &str) -> Result<WorkLookup, RemoteError>;

    /// `GET /sheet`: highest serial already issued server-side, taken from
    /// the last row's first column. `None` means the sheet is empty.
    async fn fetch_last_serial(&self) -> Result<Option<u64>, RemoteError>;

    /// `POST /sheet/sync`: upload one batch. Success means every record in
    /// the batch was accepted.
    async fn push_surveys(&self, batch: &SyncBatch) -> Result<(), RemoteError>;

    /// `POST /sheet/areas`: create an area; returns the server entry when
    /// the response includes one.
    async fn push_area(&self, name: &str) -> Result<Option<Area>, RemoteError>;

    /// `GET /sheet/areas`: authoritative area list.
    async fn fetch_areas(&self) -> Result<Vec<Area>, RemoteError>;
}
