//! Domain types for SarLab

pub mod bar;
pub mod result;

pub use bar::{Bar, PriceBar};
pub use result::SarResult;
