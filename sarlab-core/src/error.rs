//! Errors raised by the SAR engine before any output is produced.

use rust_decimal::Decimal;
use thiserror::Error;

/// Invalid input to [`crate::indicators::ParabolicSar`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SarError {
    #[error("{name} = {value} is out of range: {reason}")]
    ParameterOutOfRange {
        name: &'static str,
        value: Decimal,
        reason: &'static str,
    },

    #[error(
        "insufficient quotes for Parabolic SAR: you provided {found} periods of quotes when at least {required} are required"
    )]
    InsufficientData { found: usize, required: usize },
}

impl SarError {
    /// Name of the offending parameter, if this is a range error.
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            SarError::ParameterOutOfRange { name, .. } => Some(*name),
            SarError::InsufficientData { .. } => None,
        }
    }
}
