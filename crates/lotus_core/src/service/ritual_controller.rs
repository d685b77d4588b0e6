//! Ritual lifecycle controller.
//!
//! # Responsibility
//! - Own entries, dark-mode preference and the current ritual mode.
//! - Run the begin → compose → analyze → commit flow as explicit commands.
//!
//! # Invariants
//! - Mode cycles `Viewing -> Composing -> Processing -> Viewing`; cancel
//!   returns `Composing -> Viewing`.
//! - Oracle failures never surface; fallback payloads are used instead.
//! - Submitted text needs [`MIN_RITUAL_CHARS`] characters after trimming.
//! - A failed store write leaves the previous entries in place.
//! - `Processing` only lasts while analysis is awaited; an abandoned submit
//!   falls back to `Composing` with the same seed.

use crate::model::ritual::{next_entry_id, RitualEntry, Seed};
use crate::oracle::{fallback_seed, ResilientOracle, RitualOracle};
use crate::repo::entry_store::EntryStore;
use crate::repo::kv_store::{KeyValueStore, StoreError};
use crate::repo::preference_store::PreferenceStore;
use crate::service::calendar::{month_activity, CalendarError, MonthActivity};
use chrono::{TimeZone, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum trimmed character count accepted by `submit_ritual`.
pub const MIN_RITUAL_CHARS: usize = 10;

/// User-facing lifecycle mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RitualMode {
    /// Browsing saved rituals.
    Viewing,
    /// Writing; `seed` is `None` while the prompt request is pending.
    Composing { seed: Option<Seed> },
    /// Waiting for analysis of submitted text.
    Processing,
}

impl RitualMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewing => "viewing",
            Self::Composing { .. } => "composing",
            Self::Processing => "processing",
        }
    }
}

/// Commands accepted by the controller, used in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RitualCommand {
    BeginRitual,
    ReceiveSeed,
    SubmitRitual,
    CancelRitual,
    DeleteEntry,
}

impl Display for RitualCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::BeginRitual => "begin_ritual",
            Self::ReceiveSeed => "receive_seed",
            Self::SubmitRitual => "submit_ritual",
            Self::CancelRitual => "cancel_ritual",
            Self::DeleteEntry => "delete_entry",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum ControllerError {
    /// Command is not valid in the current mode.
    InvalidTransition {
        command: RitualCommand,
        mode: &'static str,
    },
    /// Submitted text is below [`MIN_RITUAL_CHARS`].
    ContentTooShort { min_chars: usize, actual_chars: usize },
    /// Persistence write failed.
    Store(StoreError),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTransition { command, mode } => {
                write!(f, "`{command}` is not allowed while {mode}")
            }
            Self::ContentTooShort {
                min_chars,
                actual_chars,
            } => write!(
                f,
                "ritual needs at least {min_chars} characters, got {actual_chars}"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ControllerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;

/// State returned from every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RitualSnapshot {
    pub mode: RitualMode,
    /// Saved rituals, newest first.
    pub entries: Vec<RitualEntry>,
    pub dark_mode: bool,
}

/// Holds the mode at `Processing` while analysis is awaited.
///
/// Dropping the guard, including when the submit future itself is dropped
/// mid-await, puts the composing mode back.
struct ProcessingGuard<'a> {
    mode: &'a mut RitualMode,
    restore: Option<RitualMode>,
}

impl<'a> ProcessingGuard<'a> {
    fn enter(mode: &'a mut RitualMode, restore: RitualMode) -> Self {
        *mode = RitualMode::Processing;
        Self {
            mode,
            restore: Some(restore),
        }
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            *self.mode = restore;
        }
    }
}

/// Explicit owner of ritual state; replaces process-wide UI state.
pub struct RitualController<S: KeyValueStore, O: RitualOracle> {
    entries: EntryStore<S>,
    preferences: PreferenceStore<S>,
    oracle: ResilientOracle<O>,
    mode: RitualMode,
    dark_mode: bool,
}

impl<S: KeyValueStore, O: RitualOracle> RitualController<S, O> {
    /// Hydrates entries and preferences from `storage`; starts in `Viewing`.
    pub fn open(storage: S, oracle: O) -> Self {
        let entries = EntryStore::load(storage.clone());
        let preferences = PreferenceStore::new(storage);
        let dark_mode = preferences.load_dark_mode();
        info!(
            "event=controller_open module=service status=ok entries={} dark_mode={} provider={}",
            entries.len(),
            dark_mode,
            oracle.name()
        );

        Self {
            entries,
            preferences,
            oracle: ResilientOracle::new(oracle),
            mode: RitualMode::Viewing,
            dark_mode,
        }
    }

    pub fn mode(&self) -> &RitualMode {
        &self.mode
    }

    pub fn entries(&self) -> &[RitualEntry] {
        self.entries.entries()
    }

    /// Number of saved rituals; the pond renders one pad per entry.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn snapshot(&self) -> RitualSnapshot {
        RitualSnapshot {
            mode: self.mode.clone(),
            entries: self.entries.entries().to_vec(),
            dark_mode: self.dark_mode,
        }
    }

    /// Starts a ritual and waits for its writing prompt.
    ///
    /// Equivalent to [`Self::start_composing`] followed by
    /// [`Self::receive_seed`] with the oracle's seed (or its fallback).
    pub async fn begin_ritual(&mut self) -> ControllerResult<RitualSnapshot> {
        self.start_composing()?;
        let seed = self.oracle.fetch_seed().await;
        self.receive_seed(seed)
    }

    /// `Viewing -> Composing` with the seed still pending.
    pub fn start_composing(&mut self) -> ControllerResult<RitualSnapshot> {
        self.require_viewing(RitualCommand::BeginRitual)?;
        self.mode = RitualMode::Composing { seed: None };
        info!("event=ritual_begin module=service status=ok");
        Ok(self.snapshot())
    }

    /// Attaches a writing prompt to the ritual being composed.
    pub fn receive_seed(&mut self, seed: Seed) -> ControllerResult<RitualSnapshot> {
        match &mut self.mode {
            RitualMode::Composing { seed: slot } => {
                *slot = Some(seed);
                Ok(self.snapshot())
            }
            other => Err(ControllerError::InvalidTransition {
                command: RitualCommand::ReceiveSeed,
                mode: other.as_str(),
            }),
        }
    }

    /// Analyzes `text`, saves the new ritual and returns to `Viewing`.
    ///
    /// # Errors
    /// - `InvalidTransition` outside `Composing`.
    /// - `ContentTooShort` below [`MIN_RITUAL_CHARS`]; mode is unchanged.
    /// - `Store` when the entry cannot be persisted; mode returns to
    ///   `Composing` with the same seed.
    pub async fn submit_ritual(&mut self, text: &str) -> ControllerResult<RitualSnapshot> {
        let seed = match &self.mode {
            RitualMode::Composing { seed } => seed.clone(),
            other => {
                return Err(ControllerError::InvalidTransition {
                    command: RitualCommand::SubmitRitual,
                    mode: other.as_str(),
                })
            }
        };

        let actual_chars = text.trim().chars().count();
        if actual_chars < MIN_RITUAL_CHARS {
            return Err(ControllerError::ContentTooShort {
                min_chars: MIN_RITUAL_CHARS,
                actual_chars,
            });
        }

        let analysis = {
            let _processing = ProcessingGuard::enter(
                &mut self.mode,
                RitualMode::Composing { seed: seed.clone() },
            );
            self.oracle.analyze(text).await
        };

        let seed_prompt = seed
            .as_ref()
            .map(|seed| seed.prompt.clone())
            .unwrap_or_else(|| fallback_seed().prompt);
        let now = Utc::now();
        let entry = RitualEntry::compose(
            next_entry_id(now, self.entries.entries()),
            now,
            text,
            analysis,
            seed_prompt,
        );
        let entry_id = entry.id.clone();

        if let Err(err) = self.entries.append(entry) {
            warn!(
                "event=ritual_submit module=service status=error error_code=store_write_failed error={}",
                err
            );
            self.mode = RitualMode::Composing { seed };
            return Err(err.into());
        }

        self.mode = RitualMode::Viewing;
        info!(
            "event=ritual_submit module=service status=ok entry_id={} content_chars={} entries={}",
            entry_id,
            actual_chars,
            self.entries.len()
        );
        Ok(self.snapshot())
    }

    /// Abandons the ritual being composed without saving anything.
    pub fn cancel_ritual(&mut self) -> ControllerResult<RitualSnapshot> {
        if !matches!(self.mode, RitualMode::Composing { .. }) {
            return Err(ControllerError::InvalidTransition {
                command: RitualCommand::CancelRitual,
                mode: self.mode.as_str(),
            });
        }
        self.mode = RitualMode::Viewing;
        info!("event=ritual_cancel module=service status=ok");
        Ok(self.snapshot())
    }

    /// Deletes a saved ritual immediately; unknown ids are ignored.
    pub fn delete_entry(&mut self, id: &str) -> ControllerResult<RitualSnapshot> {
        self.require_viewing(RitualCommand::DeleteEntry)?;
        let before = self.entries.len();
        self.entries.remove(id)?;
        info!(
            "event=entry_delete module=service status={} entry_id={} entries={}",
            if self.entries.len() < before { "ok" } else { "noop" },
            id,
            self.entries.len()
        );
        Ok(self.snapshot())
    }

    /// Flips and persists the dark-mode preference; allowed in any mode.
    pub fn toggle_dark_mode(&mut self) -> ControllerResult<RitualSnapshot> {
        let next = !self.dark_mode;
        self.preferences.set_dark_mode(next)?;
        self.dark_mode = next;
        info!("event=dark_mode_toggle module=service status=ok dark_mode={next}");
        Ok(self.snapshot())
    }

    /// Calendar activity for one month, dates read in `tz`.
    pub fn month_activity<Tz: TimeZone>(
        &self,
        tz: &Tz,
        year: i32,
        month: u32,
    ) -> Result<MonthActivity, CalendarError> {
        month_activity(self.entries.entries(), tz, year, month)
    }

    /// Flushes entries and preferences to storage and drops the controller.
    pub fn close(self) -> ControllerResult<()> {
        self.entries.flush()?;
        self.preferences.set_dark_mode(self.dark_mode)?;
        info!(
            "event=controller_close module=service status=ok entries={}",
            self.entries.len()
        );
        Ok(())
    }

    fn require_viewing(&self, command: RitualCommand) -> ControllerResult<()> {
        if self.mode == RitualMode::Viewing {
            Ok(())
        } else {
            Err(ControllerError::InvalidTransition {
                command,
                mode: self.mode.as_str(),
            })
        }
    }
}
