//! Bar — the price unit the SAR engine reads.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Read-only view of a price bar.
///
/// The engine only needs a timestamp and the high/low range, so callers with
/// richer bar types implement this instead of converting into [`Bar`].
pub trait PriceBar {
    fn timestamp(&self) -> NaiveDateTime;
    fn high(&self) -> Decimal;
    fn low(&self) -> Decimal;
}

/// High/low bar for a single period.
///
/// `high >= low` is expected but not enforced; see [`Bar::is_sane`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub high: Decimal,
    pub low: Decimal,
}

impl Bar {
    pub fn new(timestamp: NaiveDateTime, high: Decimal, low: Decimal) -> Self {
        Self {
            timestamp,
            high,
            low,
        }
    }

    /// Basic range sanity check: high >= low.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
    }
}

impl PriceBar for Bar {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    fn high(&self) -> Decimal {
        self.high
    }

    fn low(&self) -> Decimal {
        self.low
    }
}

impl<B: PriceBar + ?Sized> PriceBar for &B {
    fn timestamp(&self) -> NaiveDateTime {
        (**self).timestamp()
    }

    fn high(&self) -> Decimal {
        (**self).high()
    }

    fn low(&self) -> Decimal {
        (**self).low()
    }
}
