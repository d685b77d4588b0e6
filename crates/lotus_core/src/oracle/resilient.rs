//! Fallback wrapper around a fallible oracle.
//!
//! # Invariants
//! - Exactly one provider call per request; no retries.
//! - Any provider error is replaced by the fixed fallback payload.

use super::{fallback_analysis, fallback_seed, RitualOracle};
use crate::logging::sanitize_message;
use crate::model::ritual::{Analysis, Seed};
use log::{info, warn};
use std::time::Instant;

const MAX_LOGGED_ERROR_CHARS: usize = 200;

/// Oracle facade whose calls always produce a payload.
#[derive(Debug, Clone)]
pub struct ResilientOracle<O: RitualOracle> {
    inner: O,
}

impl<O: RitualOracle> ResilientOracle<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }

    /// Fetches a seed, or [`fallback_seed`] when the provider fails.
    pub async fn fetch_seed(&self) -> Seed {
        let started_at = Instant::now();
        match self.inner.fetch_seed().await {
            Ok(seed) => {
                info!(
                    "event=oracle_seed module=oracle status=ok provider={} duration_ms={}",
                    self.inner.name(),
                    started_at.elapsed().as_millis()
                );
                seed
            }
            Err(err) => {
                warn!(
                    "event=oracle_seed module=oracle status=fallback provider={} duration_ms={} error={}",
                    self.inner.name(),
                    started_at.elapsed().as_millis(),
                    sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
                );
                fallback_seed()
            }
        }
    }

    /// Analyzes `text`, or returns [`fallback_analysis`] when the provider fails.
    pub async fn analyze(&self, text: &str) -> Analysis {
        let started_at = Instant::now();
        match self.inner.analyze(text).await {
            Ok(analysis) => {
                info!(
                    "event=oracle_analyze module=oracle status=ok provider={} content_chars={} duration_ms={}",
                    self.inner.name(),
                    text.chars().count(),
                    started_at.elapsed().as_millis()
                );
                analysis
            }
            Err(err) => {
                warn!(
                    "event=oracle_analyze module=oracle status=fallback provider={} content_chars={} duration_ms={} error={}",
                    self.inner.name(),
                    text.chars().count(),
                    started_at.elapsed().as_millis(),
                    sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
                );
                fallback_analysis()
            }
        }
    }
}
