//! Core domain logic for the Lotus ritual journal.
//! This crate owns ritual persistence, the oracle boundary and the
//! lifecycle state machine; presentation lives elsewhere.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod oracle;
pub mod repo;
pub mod service;

pub use config::{ConfigError, LotusConfig, OracleConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::ritual::{Analysis, RitualEntry, RitualValidationError, Seed};
pub use oracle::{
    fallback_analysis, fallback_seed, GeminiOracle, OracleError, OracleResult, ResilientOracle,
    RitualOracle,
};
pub use repo::entry_store::{read_entries, EntryStore, RITUALS_KEY};
pub use repo::kv_store::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreError, StoreResult,
};
pub use repo::preference_store::{PreferenceStore, DARK_MODE_KEY};
pub use service::calendar::{month_activity, CalendarError, MonthActivity};
pub use service::ritual_controller::{
    ControllerError, ControllerResult, RitualCommand, RitualController, RitualMode,
    RitualSnapshot, MIN_RITUAL_CHARS,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
