//! Repository layer over key-value storage.
//!
//! # Responsibility
//! - Define the key-value storage contract and its SQLite/in-memory impls.
//! - Own serialization of rituals and preferences to fixed keys.
//!
//! # Invariants
//! - Stored values are JSON; field names of `RitualEntry` are preserved.
//! - Reads fail soft to defaults, writes report `StoreError`.

pub mod entry_store;
pub mod kv_store;
pub mod preference_store;
