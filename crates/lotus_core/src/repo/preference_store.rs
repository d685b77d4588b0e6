//! Persisted user preferences.
//!
//! # Invariants
//! - The dark-mode flag is stored as a JSON boolean under [`DARK_MODE_KEY`].
//! - Missing or malformed values read as `false`.

use crate::repo::kv_store::{KeyValueStore, StoreResult};
use log::warn;

/// Storage key holding the dark-mode flag.
pub const DARK_MODE_KEY: &str = "lotus_dark_mode";

#[derive(Debug, Clone)]
pub struct PreferenceStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> PreferenceStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn load_dark_mode(&self) -> bool {
        match self.storage.get(DARK_MODE_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<bool>(&raw).unwrap_or_else(|err| {
                warn!(
                    "event=preference_load module=repo status=fallback key={} error={}",
                    DARK_MODE_KEY, err
                );
                false
            }),
            Ok(None) => false,
            Err(err) => {
                warn!(
                    "event=preference_load module=repo status=fallback key={} error={}",
                    DARK_MODE_KEY, err
                );
                false
            }
        }
    }

    pub fn set_dark_mode(&self, enabled: bool) -> StoreResult<()> {
        let encoded = serde_json::to_string(&enabled)?;
        self.storage.set(DARK_MODE_KEY, &encoded)
    }
}
