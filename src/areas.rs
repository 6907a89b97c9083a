//! Offline-first area/society reference cache.
//!
//! Areas added while offline get a temporary local id and `isSynced: false`.
//! `refresh()` pushes those individually (tolerating per-area failures),
//! then replaces the cache with the server's authoritative list. Every read
//! path falls back to the cache so the form stays usable offline.

use std::sync::Arc;

use crate::error::StorageError;
use crate::remote::RemoteApi;
use crate::settings::{keys, SettingsStore};
use crate::types::Area;

pub struct AreaCache<S: SettingsStore> {
    settings: Arc<S>,
    remote: Arc<dyn RemoteApi>,
}

impl<S: SettingsStore> AreaCache<S> {
    pub fn new(settings: Arc<S>, remote: Arc<dyn RemoteApi>) -> Self {
        Self { settings, remote }
    }

    /// The cached list, possibly stale. Empty when nothing was ever cached.
    pub fn load(&self) -> Result<Vec<Area>, StorageError> {
        let Some(raw) = self.settings.get_item(keys::CACHED_AREAS)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(areas) => Ok(areas),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable area cache");
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, areas: &[Area]) -> Result<(), StorageError> {
        let json = serde_json::to_string(areas).map_err(|e| StorageError::Transaction {
            message: "serialize area cache".to_string(),
            source: Some(Box::new(e)),
        })?;
        self.settings.set_item(keys::CACHED_AREAS, &json)
    }

    /// Add an area, pushing it to the server when reachable. Offline (or on
    /// any server failure) the entry is cached with a temporary id and left
    /// unsynced for the next refresh.
    pub async fn add(&self, name: &str) -> Result<Area, StorageError> {
        let mut areas = self.load()?;
        let mut area = Area {
            id: areas.len() as i64 + 1,
            name: name.trim().to_string(),
            is_synced: false,
        };

        if self.remote.is_reachable().await {
            match self.remote.push_area(&area.name).await {
                Ok(remote_area) => {
                    if let Some(remote_area) = remote_area {
                        area.id = remote_area.id;
                    }
                    area.is_synced = true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, name = %area.name, "area push failed; caching unsynced");
                }
            }
        }

        areas.push(area.clone());
        self.save(&areas)?;
        Ok(area)
    }

    /// Push unsynced entries, then replace the cache from the server.
    /// Falls back to the cached list on any fetch failure.
    pub async fn refresh(&self) -> Result<Vec<Area>, StorageError> {
        let mut areas = self.load()?;

        if !self.remote.is_reachable().await {
            return Ok(areas);
        }

        for area in areas.iter_mut().filter(|a| !a.is_synced) {
            match self.remote.push_area(&area.name).await {
                Ok(_) => area.is_synced = true,
                Err(e) => {
                    tracing::warn!(error = %e, name = %area.name, "area sync failed");
                }
            }
        }

        match self.remote.fetch_areas().await {
            Ok(remote_areas) => {
                let fresh: Vec<Area> = remote_areas
                    .into_iter()
                    .map(|a| Area {
                        is_synced: true,
                        ..a
                    })
                    .collect();
                self.save(&fresh)?;
                Ok(fresh)
            }
            Err(e) => {
                tracing::warn!(error = %e, "area list fetch failed; keeping cache");
                // Keep any isSynced flags we just earned.
                self.save(&areas)?;
                Ok(areas)
            }
        }
    }
}
