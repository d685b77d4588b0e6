//! Ritual domain model.
//!
//! # Responsibility
//! - Define the records shared by storage, oracle and controller layers.
//!
//! # Invariants
//! - Every saved ritual is identified by a unique time-derived id.
//! - Deletion is a hard removal from the list; there is no tombstone state.

pub mod ritual;
