//! Per-bar SAR output record.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One SAR output row, aligned with the input bar at the same index.
///
/// `sar` and `is_reversal` are both `None` until the trend direction has
/// been confirmed by the first reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarResult {
    pub timestamp: NaiveDateTime,
    pub sar: Option<Decimal>,
    pub is_reversal: Option<bool>,
}

impl SarResult {
    /// A result with no established stop.
    pub fn unestablished(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            sar: None,
            is_reversal: None,
        }
    }

    pub fn established(timestamp: NaiveDateTime, sar: Decimal, is_reversal: bool) -> Self {
        Self {
            timestamp,
            sar: Some(sar),
            is_reversal: Some(is_reversal),
        }
    }

    pub fn is_established(&self) -> bool {
        self.sar.is_some()
    }

    /// Clear both fields, keeping the timestamp.
    pub(crate) fn invalidate(&mut self) {
        self.sar = None;
        self.is_reversal = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn invalidate_keeps_timestamp() {
        let mut r = SarResult::established(ts(), dec!(101.5), true);
        assert!(r.is_established());
        r.invalidate();
        assert_eq!(r, SarResult::unestablished(ts()));
    }

    #[test]
    fn unestablished_serializes_nulls() {
        let json = serde_json::to_value(SarResult::unestablished(ts())).unwrap();
        assert!(json["sar"].is_null());
        assert!(json["is_reversal"].is_null());
    }
}
