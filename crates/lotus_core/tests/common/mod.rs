use lotus_core::db::DbError;
use lotus_core::{KeyValueStore, MemoryKeyValueStore, StoreError, StoreResult};
use std::cell::Cell;
use std::rc::Rc;

/// Memory storage whose writes can be switched off.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: MemoryKeyValueStore,
    reject_writes: Rc<Cell<bool>>,
}

impl FlakyStore {
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.reject_writes.get() {
            return Err(StoreError::Db(DbError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            ))));
        }
        self.inner.set(key, value)
    }
}
