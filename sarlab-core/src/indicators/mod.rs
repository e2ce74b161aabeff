//! Indicator implementations.
//!
//! Indicators are pure functions: an ordered bar history in, one result per
//! bar out. They never sort or deduplicate their input.

pub mod parabolic_sar;

pub use parabolic_sar::{
    parabolic_sar, parabolic_sar_extended, ParabolicSar, SarParams, MIN_BARS,
};

/// Create daily bars from `(high, low)` pairs for testing.
#[cfg(test)]
pub fn make_bars(rows: &[(rust_decimal::Decimal, rust_decimal::Decimal)]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    rows.iter()
        .enumerate()
        .map(|(i, &(high, low))| Bar::new(base + chrono::Duration::days(i as i64), high, low))
        .collect()
}
