//! SarLab Core — Parabolic SAR engine and the plumbing around it.
//!
//! This crate contains:
//! - Domain types (bars, per-bar SAR results)
//! - The SAR recurrence engine with its lead-in correction pass
//! - Parameter validation and errors
//! - Warm-up trimming and result helpers
//! - Series ordering checks and a synthetic bar generator
//! - TOML configuration

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod warmup;

pub use config::{ConfigError, SarConfig};
pub use domain::{Bar, PriceBar, SarResult};
pub use error::SarError;
pub use indicators::{parabolic_sar, parabolic_sar_extended, ParabolicSar, SarParams};
pub use warmup::{condense, remove_warmup, WarmupPolicy};
