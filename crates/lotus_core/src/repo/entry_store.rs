//! Ritual entry store.
//!
//! # Responsibility
//! - Hold the newest-first list of saved rituals in memory.
//! - Mirror every mutation to key-value storage under [`RITUALS_KEY`].
//!
//! # Invariants
//! - `append` places the new entry at index 0.
//! - Storage is written before the in-memory list changes; a failed write
//!   leaves both at their previous state.
//! - Loading never fails: missing or malformed data hydrates an empty list.

use crate::model::ritual::RitualEntry;
use crate::repo::kv_store::{KeyValueStore, StoreError, StoreResult};
use log::{debug, info, warn};
use std::collections::HashSet;

/// Storage key holding the serialized ritual list.
pub const RITUALS_KEY: &str = "lotus_rituals";

/// In-memory ritual list mirrored to key-value storage.
#[derive(Debug)]
pub struct EntryStore<S: KeyValueStore> {
    storage: S,
    entries: Vec<RitualEntry>,
}

impl<S: KeyValueStore> EntryStore<S> {
    /// Hydrates the store from `storage`, falling back to an empty list.
    pub fn load(storage: S) -> Self {
        let entries = read_entries(&storage);
        info!(
            "event=entries_load module=repo status=ok count={}",
            entries.len()
        );
        Self { storage, entries }
    }

    /// Current entries, newest first.
    pub fn entries(&self) -> &[RitualEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RitualEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Prepends `entry` and persists the new list.
    ///
    /// # Errors
    /// - `Validation` when the entry breaks model invariants.
    /// - `DuplicateId` when an entry with the same id is already stored.
    /// - `Db`/`Encode` when the write fails; memory is left untouched.
    pub fn append(&mut self, entry: RitualEntry) -> StoreResult<&[RitualEntry]> {
        entry.validate()?;
        if self.get(&entry.id).is_some() {
            return Err(StoreError::DuplicateId(entry.id));
        }

        let mut next = Vec::with_capacity(self.entries.len() + 1);
        next.push(entry);
        next.extend(self.entries.iter().cloned());
        self.commit(next)?;

        debug!(
            "event=entry_append module=repo status=ok count={}",
            self.entries.len()
        );
        Ok(self.entries.as_slice())
    }

    /// Removes the entry with `id`; unknown ids are a no-op without a write.
    pub fn remove(&mut self, id: &str) -> StoreResult<&[RitualEntry]> {
        if self.get(id).is_none() {
            debug!("event=entry_remove module=repo status=noop");
            return Ok(self.entries.as_slice());
        }

        let next = self
            .entries
            .iter()
            .filter(|entry| entry.id != id)
            .cloned()
            .collect();
        self.commit(next)?;

        debug!(
            "event=entry_remove module=repo status=ok count={}",
            self.entries.len()
        );
        Ok(self.entries.as_slice())
    }

    /// Rewrites the current list to storage.
    pub fn flush(&self) -> StoreResult<()> {
        write_entries(&self.storage, &self.entries)
    }

    fn commit(&mut self, next: Vec<RitualEntry>) -> StoreResult<()> {
        write_entries(&self.storage, &next)?;
        self.entries = next;
        Ok(())
    }
}

/// Reads the persisted ritual list.
///
/// Any failure (storage error, bad JSON, wrong shape, invalid or duplicate
/// entries) is logged and yields an empty list.
pub fn read_entries<S: KeyValueStore>(storage: &S) -> Vec<RitualEntry> {
    let raw = match storage.get(RITUALS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(
                "event=entries_load module=repo status=fallback error_code=read_failed error={}",
                err
            );
            return Vec::new();
        }
    };

    let entries: Vec<RitualEntry> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(
                "event=entries_load module=repo status=fallback error_code=malformed_blob bytes={} error={}",
                raw.len(),
                err
            );
            return Vec::new();
        }
    };

    let mut seen = HashSet::with_capacity(entries.len());
    for entry in &entries {
        if let Err(err) = entry.validate() {
            warn!(
                "event=entries_load module=repo status=fallback error_code=invalid_entry error={}",
                err
            );
            return Vec::new();
        }
        if !seen.insert(entry.id.as_str()) {
            warn!(
                "event=entries_load module=repo status=fallback error_code=duplicate_id id={}",
                entry.id
            );
            return Vec::new();
        }
    }

    entries
}

fn write_entries<S: KeyValueStore>(storage: &S, entries: &[RitualEntry]) -> StoreResult<()> {
    let encoded = serde_json::to_string(entries)?;
    storage.set(RITUALS_KEY, &encoded)
}
