//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate stores and the oracle into ritual lifecycle commands.
//! - Keep host/UI layers decoupled from storage and provider details.

pub mod calendar;
pub mod ritual_controller;
