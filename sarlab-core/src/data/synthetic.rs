//! Deterministic synthetic bars.
//!
//! A seeded random walk over weekdays, used when no real data is at hand
//! (CLI `--synthetic`, benchmarks, property tests). The same label always
//! produces the same series. Prices are rounded to cents so every value is
//! an exact decimal.

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::domain::Bar;

const START_PRICE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Generate `count` weekday bars starting at `start` (or the next weekday).
pub fn synthetic_bars(label: &str, start: NaiveDate, count: usize) -> Vec<Bar> {
    // Deterministic seed from label
    let seed: [u8; 32] = *blake3::hash(label.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::with_capacity(count);
    let mut price = START_PRICE;
    let mut current = start;

    while bars.len() < count {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        // returns in basis points: +/-3% close-to-close, up to 1% wicks
        let daily_return = Decimal::new(rng.gen_range(-300..=300), 4);
        let upper_wick = Decimal::new(rng.gen_range(0..=100), 4);
        let lower_wick = Decimal::new(rng.gen_range(0..=100), 4);

        let open = price;
        let close = (price * (Decimal::ONE + daily_return)).round_dp(2);
        let high = (open.max(close) * (Decimal::ONE + upper_wick)).round_dp(2);
        let low = (open.min(close) * (Decimal::ONE - lower_wick)).round_dp(2);

        bars.push(Bar::new(current.and_time(chrono::NaiveTime::MIN), high, low));

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}
