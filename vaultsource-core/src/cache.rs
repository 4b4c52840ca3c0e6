//! Per-path cache of secret field maps.
//!
//! Guarantees at most one successful fetch per distinct [`SecretPath`] for the
//! lifetime of the cache, including under concurrent first access. There is
//! no eviction and no TTL; once stored, an entry is never replaced.
//!
//! # Locking
//!
//! A short-lived outer lock maps each path to its own slot. The miss path
//! (check, fetch, store) runs under the slot lock only, so callers waiting on
//! one path never block fetches of other paths. A failed fetch leaves the
//! slot empty and the next caller tries again.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::VaultError;
use crate::model::{SecretFieldMap, SecretPath};

type Slot = Arc<Mutex<Option<SecretFieldMap>>>;

/// Cache of fetched secrets, keyed by path.
#[derive(Default)]
pub struct SecretCache {
    slots: Mutex<HashMap<SecretPath, Slot>>,
}

impl SecretCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached field map for `path`, calling `fetch` on a miss.
    ///
    /// `fetch` runs at most once per path unless it fails.
    pub fn get_or_fetch<F>(&self, path: &SecretPath, fetch: F) -> Result<SecretFieldMap, VaultError>
    where
        F: FnOnce(&SecretPath) -> Result<SecretFieldMap, VaultError>,
    {
        let slot = self.slot(path);
        let mut entry = slot.lock();

        if let Some(fields) = entry.as_ref() {
            tracing::debug!(path = %path, "secret cache hit");
            return Ok(fields.clone());
        }

        tracing::debug!(path = %path, "secret cache miss");
        let fields = fetch(path)?;
        *entry = Some(fields.clone());
        Ok(fields)
    }

    /// Cached field map for `path`, without fetching.
    pub fn get(&self, path: &SecretPath) -> Option<SecretFieldMap> {
        let slot = self.slots.lock().get(path).cloned()?;
        let entry = slot.lock();
        entry.clone()
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots.lock().values().cloned().collect();
        slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, path: &SecretPath) -> Slot {
        self.slots.lock().entry(path.clone()).or_default().clone()
    }
}

impl fmt::Debug for SecretCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCache")
            .field("entries", &self.len())
            .finish()
    }
}
