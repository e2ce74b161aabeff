//! Ordering helpers for bar series.
//!
//! The SAR engine trusts its input to be strictly ascending by timestamp.
//! These helpers let callers get there from raw data, or check that they
//! already are.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::PriceBar;

/// A series that is not strictly ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("duplicate timestamp {timestamp} at bar {index}")]
    DuplicateTimestamp {
        timestamp: NaiveDateTime,
        index: usize,
    },

    #[error("bar {index} is out of order: {current} follows {previous}")]
    OutOfOrder {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
}

/// Stable sort ascending by timestamp.
pub fn sort_bars<B: PriceBar>(bars: &mut [B]) {
    bars.sort_by_key(|b| b.timestamp());
}

/// Check that timestamps are strictly ascending, reporting the first
/// offending bar.
pub fn validate_series<B: PriceBar>(bars: &[B]) -> Result<(), SeriesError> {
    for (i, pair) in bars.windows(2).enumerate() {
        let previous = pair[0].timestamp();
        let current = pair[1].timestamp();
        if current == previous {
            return Err(SeriesError::DuplicateTimestamp {
                timestamp: current,
                index: i + 1,
            });
        }
        if current < previous {
            return Err(SeriesError::OutOfOrder {
                index: i + 1,
                previous,
                current,
            });
        }
    }
    Ok(())
}
