mod common;

use common::FlakyStore;
use lotus_core::db::open_db_in_memory;
use lotus_core::{
    read_entries, EntryStore, KeyValueStore, MemoryKeyValueStore, RitualEntry, SqliteKeyValueStore,
    StoreError, RITUALS_KEY,
};
use proptest::prelude::*;

fn entry(id: &str) -> RitualEntry {
    RitualEntry {
        id: id.to_string(),
        date: "2024-01-01T00:00:00Z".to_string(),
        content: "hello world".to_string(),
        summary: "s".to_string(),
        mood: "calm".to_string(),
        seed: "p".to_string(),
    }
}

fn ids(entries: &[RitualEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.id.as_str()).collect()
}

#[test]
fn append_to_empty_store() {
    let mut store = EntryStore::load(MemoryKeyValueStore::new());
    assert!(store.is_empty());

    let entries = store.append(entry("1")).unwrap();
    assert_eq!(entries, [entry("1")]);
}

#[test]
fn append_places_newest_first() {
    let mut store = EntryStore::load(MemoryKeyValueStore::new());
    store.append(entry("1")).unwrap();
    store.append(entry("2")).unwrap();
    let entries = store.append(entry("3")).unwrap();

    assert_eq!(ids(entries), ["3", "2", "1"]);
}

#[test]
fn remove_filters_matching_id() {
    let mut store = EntryStore::load(MemoryKeyValueStore::new());
    store.append(entry("2")).unwrap();
    store.append(entry("1")).unwrap();

    let entries = store.remove("1").unwrap();
    assert_eq!(ids(entries), ["2"]);
    assert!(store.get("1").is_none());
}

#[test]
fn remove_unknown_id_is_noop() {
    let storage = FlakyStore::default();
    let mut store = EntryStore::load(storage.clone());
    store.append(entry("1")).unwrap();
    store.append(entry("2")).unwrap();
    let before = store.entries().to_vec();

    // No write is attempted for an unknown id.
    storage.reject_writes(true);
    let after = store.remove("missing").unwrap();
    assert_eq!(after, before.as_slice());
}

#[test]
fn replay_matches_memory_after_mixed_operations() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteKeyValueStore::new(&conn);
    let mut store = EntryStore::load(storage);

    store.append(entry("1")).unwrap();
    store.append(entry("2")).unwrap();
    store.remove("1").unwrap();
    store.append(entry("3")).unwrap();
    store.remove("missing").unwrap();
    store.append(entry("4")).unwrap();
    store.remove("3").unwrap();

    let replayed = EntryStore::load(storage);
    assert_eq!(replayed.entries(), store.entries());
    assert_eq!(ids(replayed.entries()), ["4", "2"]);
}

#[test]
fn duplicate_and_invalid_entries_are_rejected() {
    let mut store = EntryStore::load(MemoryKeyValueStore::new());
    store.append(entry("1")).unwrap();

    let err = store.append(entry("1")).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId(id) if id == "1"));

    let mut undated = entry("2");
    undated.date = "sometime".to_string();
    let err = store.append(undated).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    assert_eq!(ids(store.entries()), ["1"]);
}

#[test]
fn failed_write_leaves_memory_and_storage_unchanged() {
    let storage = FlakyStore::default();
    let mut store = EntryStore::load(storage.clone());
    store.append(entry("1")).unwrap();

    storage.reject_writes(true);
    assert!(store.append(entry("2")).is_err());
    assert!(store.remove("1").is_err());

    assert_eq!(ids(store.entries()), ["1"]);
    assert_eq!(ids(&read_entries(&storage)), ["1"]);
}

#[test]
fn malformed_blob_loads_empty() {
    let storage = MemoryKeyValueStore::new();
    storage.set(RITUALS_KEY, "not json").unwrap();
    assert!(EntryStore::load(storage.clone()).is_empty());

    storage.set(RITUALS_KEY, r#"{"id":"1"}"#).unwrap();
    assert!(read_entries(&storage).is_empty());

    storage.set(RITUALS_KEY, r#"[{"id":"1"}]"#).unwrap();
    assert!(read_entries(&storage).is_empty());
}

#[test]
fn blob_with_duplicate_ids_loads_empty() {
    let storage = MemoryKeyValueStore::new();
    let blob = serde_json::to_string(&[entry("1"), entry("1")]).unwrap();
    storage.set(RITUALS_KEY, &blob).unwrap();

    assert!(read_entries(&storage).is_empty());
}

#[test]
fn missing_key_loads_empty() {
    let conn = open_db_in_memory().unwrap();
    let store = EntryStore::load(SqliteKeyValueStore::new(&conn));
    assert!(store.is_empty());
}

#[test]
fn flush_rewrites_current_list() {
    let storage = MemoryKeyValueStore::new();
    let mut store = EntryStore::load(storage.clone());
    store.append(entry("1")).unwrap();

    storage.set(RITUALS_KEY, "[]").unwrap();
    assert!(read_entries(&storage).is_empty());

    store.flush().unwrap();
    assert_eq!(ids(&read_entries(&storage)), ["1"]);
}

#[derive(Debug, Clone)]
enum StoreOp {
    Append,
    RemoveExisting(proptest::sample::Index),
    RemoveMissing,
}

fn store_op() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        3 => Just(StoreOp::Append),
        2 => any::<proptest::sample::Index>().prop_map(StoreOp::RemoveExisting),
        1 => Just(StoreOp::RemoveMissing),
    ]
}

/// Applies `ops`, checking order and replay fidelity after each step.
fn replay_after_each_op<S: KeyValueStore>(
    storage: S,
    ops: &[StoreOp],
) -> Result<(), TestCaseError> {
    let mut store = EntryStore::load(storage.clone());
    let mut next_id = 0u32;

    for op in ops {
        match op {
            StoreOp::Append => {
                next_id += 1;
                let appended = entry(&next_id.to_string());
                store.append(appended.clone()).unwrap();
                prop_assert_eq!(&store.entries()[0], &appended);
            }
            StoreOp::RemoveExisting(index) => {
                if store.is_empty() {
                    continue;
                }
                let id = store.entries()[index.index(store.len())].id.clone();
                let before = store.len();
                store.remove(&id).unwrap();
                prop_assert!(store.get(&id).is_none());
                prop_assert_eq!(store.len(), before - 1);
            }
            StoreOp::RemoveMissing => {
                let before = store.entries().to_vec();
                store.remove("missing").unwrap();
                prop_assert_eq!(store.entries(), before.as_slice());
            }
        }

        let replayed = EntryStore::load(storage.clone());
        prop_assert_eq!(replayed.entries(), store.entries());
    }
    Ok(())
}

proptest! {
    #[test]
    fn replay_matches_memory_for_any_sequence(ops in proptest::collection::vec(store_op(), 0..40)) {
        replay_after_each_op(MemoryKeyValueStore::new(), &ops)?;

        let conn = open_db_in_memory().unwrap();
        replay_after_each_op(SqliteKeyValueStore::new(&conn), &ops)?;
    }
}
