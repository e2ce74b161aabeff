//! Bar series plumbing around the engine: ordering checks and synthetic data.

pub mod series;
pub mod synthetic;

pub use series::{sort_bars, validate_series, SeriesError};
pub use synthetic::synthetic_bars;
