//! Warm-up handling for SAR result sequences.
//!
//! The engine always returns one result per bar. Callers that only want
//! settled values pick a [`WarmupPolicy`] or call the helpers directly.

use serde::{Deserialize, Serialize};

use crate::domain::SarResult;

/// What to do with results whose stop is not yet established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupPolicy {
    /// Return every result, nulls included.
    #[default]
    Keep,
    /// Drop the leading run of null results.
    Trim,
    /// Drop every null result wherever it appears.
    Condense,
}

impl WarmupPolicy {
    pub fn apply(self, results: Vec<SarResult>) -> Vec<SarResult> {
        match self {
            WarmupPolicy::Keep => results,
            WarmupPolicy::Trim => remove_warmup(results),
            WarmupPolicy::Condense => condense(results),
        }
    }
}

impl std::str::FromStr for WarmupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(WarmupPolicy::Keep),
            "trim" => Ok(WarmupPolicy::Trim),
            "condense" => Ok(WarmupPolicy::Condense),
            other => Err(format!(
                "unknown warmup policy '{other}' (expected keep, trim or condense)"
            )),
        }
    }
}

/// Number of leading results with no established stop.
pub fn warmup_len(results: &[SarResult]) -> usize {
    results
        .iter()
        .position(SarResult::is_established)
        .unwrap_or(results.len())
}

/// Return the suffix starting at the first established result.
///
/// Empty when no result is established.
pub fn remove_warmup(mut results: Vec<SarResult>) -> Vec<SarResult> {
    let skip = warmup_len(&results);
    results.drain(..skip);
    results
}

/// Keep only results with an established stop.
pub fn condense(mut results: Vec<SarResult>) -> Vec<SarResult> {
    results.retain(SarResult::is_established);
    results
}

/// Indices of bars flagged as reversals.
pub fn reversal_indices(results: &[SarResult]) -> Vec<usize> {
    results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_reversal == Some(true))
        .map(|(i, _)| i)
        .collect()
}
