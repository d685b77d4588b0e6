//! External seed/analysis oracle.
//!
//! # Responsibility
//! - Define the provider-agnostic contract for writing prompts and
//!   reflection analysis.
//! - Provide the fallback payloads used whenever a provider call fails.
//!
//! # Invariants
//! - Provider implementations may fail; [`ResilientOracle`] never does.
//! - Fallback payloads are fixed values, independent of input.

use crate::model::ritual::{Analysis, Seed};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod gemini;
pub mod resilient;

pub use gemini::GeminiOracle;
pub use resilient::ResilientOracle;

pub type OracleResult<T> = Result<T, OracleError>;

/// Seed returned when the provider cannot be reached or answers garbage.
pub fn fallback_seed() -> Seed {
    Seed::new("Reflect on a moment of quiet peace from your day.", "Peace")
}

/// Analysis returned when the provider cannot be reached or answers garbage.
pub fn fallback_analysis() -> Analysis {
    Analysis::new("Words released to the water.", "Quiet Contemplation")
}

/// Provider failure kinds.
#[derive(Debug)]
pub enum OracleError {
    /// No API key configured.
    MissingApiKey,
    /// Request could not be built, sent or read.
    Transport(reqwest::Error),
    /// Provider answered with a non-success status.
    Status { status: u16, body: String },
    /// Response text did not match the expected JSON shape.
    Decode(serde_json::Error),
    /// Any other provider-specific failure.
    Unavailable(String),
}

impl Display for OracleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "oracle api key is not configured"),
            Self::Transport(err) => write!(f, "oracle transport failed: {err}"),
            Self::Status { status, body } => write!(f, "oracle returned status {status}: {body}"),
            Self::Decode(err) => write!(f, "oracle response did not decode: {err}"),
            Self::Unavailable(message) => write!(f, "oracle unavailable: {message}"),
        }
    }
}

impl Error for OracleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OracleError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<serde_json::Error> for OracleError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

/// Source of writing prompts and reflection analysis.
#[async_trait]
pub trait RitualOracle: Send + Sync {
    /// Short identifier used in log events.
    fn name(&self) -> &str;

    /// Produces a writing prompt and theme for a new ritual.
    async fn fetch_seed(&self) -> OracleResult<Seed>;

    /// Summarizes `text` and names its mood.
    async fn analyze(&self, text: &str) -> OracleResult<Analysis>;
}
