//! Ritual domain model.
//!
//! # Responsibility
//! - Define the journal entry record persisted by the entry store.
//! - Define the seed/analysis payloads exchanged with the oracle.
//! - Generate time-derived entry ids and ISO-8601 creation stamps.
//!
//! # Invariants
//! - `id` is non-empty and unique within one store.
//! - `date` is an RFC 3339 timestamp.
//! - Entries are never edited after creation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Writing prompt returned by the oracle before composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    /// Short poetic prompt shown above the writing surface.
    pub prompt: String,
    /// One or two word theme label.
    pub theme: String,
}

impl Seed {
    pub fn new(prompt: impl Into<String>, theme: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            theme: theme.into(),
        }
    }
}

/// Oracle reading of one ritual text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// One-sentence summary.
    pub summary: String,
    /// Single mood label.
    pub mood: String,
}

impl Analysis {
    pub fn new(summary: impl Into<String>, mood: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            mood: mood.into(),
        }
    }
}

/// Validation errors for ritual entry invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RitualValidationError {
    EmptyId,
    InvalidDate(String),
}

impl Display for RitualValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "ritual id must not be empty"),
            Self::InvalidDate(value) => {
                write!(f, "ritual date `{value}` is not an RFC 3339 timestamp")
            }
        }
    }
}

impl Error for RitualValidationError {}

/// One saved ritual.
///
/// Field names are part of the persisted format and must not be renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RitualEntry {
    /// Epoch-millisecond string, unique per store; see [`next_entry_id`].
    pub id: String,
    /// Creation time, e.g. `2024-01-01T00:00:00.000Z`.
    pub date: String,
    /// User text exactly as submitted.
    pub content: String,
    pub summary: String,
    pub mood: String,
    /// Prompt text the entry was written against.
    pub seed: String,
}

impl RitualEntry {
    /// Builds an entry from the written text, its analysis and seed prompt.
    ///
    /// # Invariants
    /// - `date` is rendered from `created_at` with millisecond precision.
    /// - The caller owns id uniqueness; see [`next_entry_id`].
    pub fn compose(
        id: impl Into<String>,
        created_at: DateTime<Utc>,
        content: impl Into<String>,
        analysis: Analysis,
        seed: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date: format_entry_date(created_at),
            content: content.into(),
            summary: analysis.summary,
            mood: analysis.mood,
            seed: seed.into(),
        }
    }

    /// Checks record invariants before persistence.
    pub fn validate(&self) -> Result<(), RitualValidationError> {
        if self.id.trim().is_empty() {
            return Err(RitualValidationError::EmptyId);
        }
        if self.created_at().is_none() {
            return Err(RitualValidationError::InvalidDate(self.date.clone()));
        }
        Ok(())
    }

    /// Parsed creation time, `None` when `date` is malformed.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|value| value.with_timezone(&Utc))
    }
}

/// Renders a timestamp the way entry dates are stored.
pub fn format_entry_date(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Derives a fresh entry id from the creation instant.
///
/// Ids are epoch milliseconds. When `now` does not move past every numeric
/// id in `existing`, the next free value after the maximum is used instead,
/// so ids stay unique and increasing even for same-millisecond writes.
/// A stored id at `i64::MAX` leaves no numeric successor; the id then
/// becomes `<millis>-<n>` with the first unused `n`.
pub fn next_entry_id<'a>(
    now: DateTime<Utc>,
    existing: impl IntoIterator<Item = &'a RitualEntry>,
) -> String {
    let existing: Vec<&RitualEntry> = existing.into_iter().collect();
    let candidate = now.timestamp_millis();
    let max_existing = existing
        .iter()
        .filter_map(|entry| entry.id.parse::<i64>().ok())
        .max();

    let numeric = match max_existing {
        Some(max) if max >= candidate => max.checked_add(1),
        _ => Some(candidate),
    };
    match numeric {
        Some(id) => id.to_string(),
        None => suffixed_entry_id(candidate, &existing),
    }
}

fn suffixed_entry_id(millis: i64, existing: &[&RitualEntry]) -> String {
    let mut suffix: u64 = 1;
    loop {
        let id = format!("{millis}-{suffix}");
        if !existing.iter().any(|entry| entry.id == id) {
            return id;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{format_entry_date, next_entry_id, Analysis, RitualEntry, RitualValidationError};
    use chrono::{TimeZone, Utc};

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

    #[test]
    fn date_matches_millisecond_iso_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_entry_date(at), "2024-03-09T07:05:01.000Z");
    }

    #[test]
    fn next_id_uses_clock_when_ahead_of_store() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let existing = [entry("1600000000000")];
        assert_eq!(next_entry_id(at, &existing), "1700000000000");
    }

    #[test]
    fn next_id_moves_past_same_millisecond_collision() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let existing = [entry("1700000000000"), entry("legacy")];
        assert_eq!(next_entry_id(at, &existing), "1700000000001");
    }

    #[test]
    fn next_id_at_numeric_ceiling_uses_free_suffix() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let mut existing = vec![entry(&i64::MAX.to_string())];
        assert_eq!(next_entry_id(at, &existing), "1700000000000-1");

        existing.push(entry("1700000000000-1"));
        assert_eq!(next_entry_id(at, &existing), "1700000000000-2");
    }

    #[test]
    fn validate_rejects_blank_id_and_bad_date() {
        assert_eq!(entry("  ").validate(), Err(RitualValidationError::EmptyId));

        let mut bad_date = entry("1");
        bad_date.date = "yesterday".to_string();
        assert!(matches!(
            bad_date.validate(),
            Err(RitualValidationError::InvalidDate(_))
        ));
    }

    #[test]
    fn compose_copies_analysis_fields() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let built = RitualEntry::compose("42", at, "text", Analysis::new("sum", "Calm"), "prompt");
        assert_eq!(built.summary, "sum");
        assert_eq!(built.mood, "Calm");
        assert_eq!(built.seed, "prompt");
        assert_eq!(built.date, "2024-01-01T00:00:00.000Z");
        assert!(built.validate().is_ok());
    }
}
