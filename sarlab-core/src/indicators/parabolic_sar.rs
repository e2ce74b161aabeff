//! Parabolic SAR — Wilder's stop-and-reverse with an acceleration factor.
//!
//! Inherently sequential/stateful: maintains direction, extreme point (EP),
//! acceleration factor (AF) and the stop carried into the next bar.
//!
//! The computation runs in two passes:
//! 1. [`forward_pass`] walks the bars left to right and emits a raw result per
//!    bar, starting from an assumed uptrend.
//! 2. [`invalidate_lead_in`] nulls every result up to and including the first
//!    reversal, since the assumed starting direction is never confirmed
//!    before that point.
//!
//! Parameters: acceleration step (default 0.02), max AF (default 0.20),
//! initial AF (defaults to the step). Needs at least 2 bars.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{PriceBar, SarResult};
use crate::error::SarError;

/// Minimum number of bars accepted by [`ParabolicSar::compute`].
pub const MIN_BARS: usize = 2;

/// Default acceleration step (and initial AF for the standard variant).
pub const DEFAULT_ACCELERATION_STEP: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Default AF ceiling.
pub const DEFAULT_MAX_ACCELERATION_FACTOR: Decimal = Decimal::from_parts(2, 0, 0, false, 1);

/// Tuning parameters for the SAR recurrence.
///
/// In config files `initial_step` may be omitted, in which case it follows
/// `acceleration_step` (the standard variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SarParamsFields")]
pub struct SarParams {
    pub acceleration_step: Decimal,
    pub max_acceleration_factor: Decimal,
    pub initial_step: Decimal,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SarParamsFields {
    #[serde(default = "default_step")]
    acceleration_step: Decimal,
    #[serde(default = "default_max")]
    max_acceleration_factor: Decimal,
    initial_step: Option<Decimal>,
}

fn default_step() -> Decimal {
    DEFAULT_ACCELERATION_STEP
}

fn default_max() -> Decimal {
    DEFAULT_MAX_ACCELERATION_FACTOR
}

impl From<SarParamsFields> for SarParams {
    fn from(fields: SarParamsFields) -> Self {
        Self {
            acceleration_step: fields.acceleration_step,
            max_acceleration_factor: fields.max_acceleration_factor,
            initial_step: fields.initial_step.unwrap_or(fields.acceleration_step),
        }
    }
}

impl Default for SarParams {
    fn default() -> Self {
        Self::standard(DEFAULT_ACCELERATION_STEP, DEFAULT_MAX_ACCELERATION_FACTOR)
    }
}

impl SarParams {
    /// Standard variant: the initial AF equals the step.
    pub fn standard(acceleration_step: Decimal, max_acceleration_factor: Decimal) -> Self {
        Self::extended(acceleration_step, max_acceleration_factor, acceleration_step)
    }

    /// Extended variant: all three factors set independently.
    pub fn extended(
        acceleration_step: Decimal,
        max_acceleration_factor: Decimal,
        initial_step: Decimal,
    ) -> Self {
        Self {
            acceleration_step,
            max_acceleration_factor,
            initial_step,
        }
    }

    /// Check the parameter ranges in a fixed order, reporting the first
    /// violation.
    pub fn validate(&self) -> Result<(), SarError> {
        if self.acceleration_step <= Decimal::ZERO {
            return Err(SarError::ParameterOutOfRange {
                name: "accelerationStep",
                value: self.acceleration_step,
                reason: "must be greater than 0",
            });
        }
        if self.max_acceleration_factor <= Decimal::ZERO {
            return Err(SarError::ParameterOutOfRange {
                name: "maxAccelerationFactor",
                value: self.max_acceleration_factor,
                reason: "must be greater than 0",
            });
        }
        if self.acceleration_step > self.max_acceleration_factor {
            return Err(SarError::ParameterOutOfRange {
                name: "accelerationStep",
                value: self.acceleration_step,
                reason: "must not exceed maxAccelerationFactor",
            });
        }
        if self.initial_step <= Decimal::ZERO || self.initial_step >= self.max_acceleration_factor {
            return Err(SarError::ParameterOutOfRange {
                name: "initialStep",
                value: self.initial_step,
                reason: "must be greater than 0 and less than maxAccelerationFactor",
            });
        }
        Ok(())
    }
}

/// Validated Parabolic SAR calculator.
#[derive(Debug, Clone)]
pub struct ParabolicSar {
    params: SarParams,
    name: String,
}

impl ParabolicSar {
    /// Build a calculator, rejecting out-of-range parameters.
    pub fn new(params: SarParams) -> Result<Self, SarError> {
        params.validate()?;
        Ok(Self::from_valid(params))
    }

    /// Default parameters: 0.02, 0.20, 0.02
    pub fn default_params() -> Self {
        Self::from_valid(SarParams::default())
    }

    fn from_valid(params: SarParams) -> Self {
        Self {
            name: format!(
                "psar_{}_{}_{}",
                params.acceleration_step, params.max_acceleration_factor, params.initial_step
            ),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &SarParams {
        &self.params
    }

    /// Compute one result per bar.
    ///
    /// `bars` must already be sorted ascending by timestamp; nothing here
    /// re-sorts or deduplicates.
    pub fn compute<B: PriceBar>(&self, bars: &[B]) -> Result<Vec<SarResult>, SarError> {
        if bars.len() < MIN_BARS {
            return Err(SarError::InsufficientData {
                found: bars.len(),
                required: MIN_BARS,
            });
        }

        let mut results = forward_pass(bars, &self.params);
        let reversals = results
            .iter()
            .filter(|r| r.is_reversal == Some(true))
            .count();

        match invalidate_lead_in(&mut results) {
            Some(first) => debug!(
                indicator = %self.name,
                bars = bars.len(),
                reversals,
                lead_in = first + 1,
                "parabolic SAR computed"
            ),
            None => warn!(
                indicator = %self.name,
                bars = bars.len(),
                "no reversal in series; initial uptrend assumption left uncorrected"
            ),
        }

        Ok(results)
    }
}

/// Standard variant: initial AF equals `acceleration_step`.
pub fn parabolic_sar<B: PriceBar>(
    bars: &[B],
    acceleration_step: Decimal,
    max_acceleration_factor: Decimal,
) -> Result<Vec<SarResult>, SarError> {
    ParabolicSar::new(SarParams::standard(acceleration_step, max_acceleration_factor))?
        .compute(bars)
}

/// Extended variant with an independent initial AF.
pub fn parabolic_sar_extended<B: PriceBar>(
    bars: &[B],
    acceleration_step: Decimal,
    max_acceleration_factor: Decimal,
    initial_step: Decimal,
) -> Result<Vec<SarResult>, SarError> {
    ParabolicSar::new(SarParams::extended(
        acceleration_step,
        max_acceleration_factor,
        initial_step,
    ))?
    .compute(bars)
}

/// Rolling state threaded through the forward scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecurrenceState {
    pub(crate) acceleration_factor: Decimal,
    pub(crate) extreme_point: Decimal,
    pub(crate) prior_sar: Decimal,
    pub(crate) is_rising: bool,
}

impl RecurrenceState {
    /// Seed from the first bar. The rising direction is a guess; the first
    /// bar alone cannot establish a trend.
    pub(crate) fn seed<B: PriceBar>(first: &B, params: &SarParams) -> Self {
        Self {
            acceleration_factor: params.initial_step,
            extreme_point: first.high(),
            prior_sar: first.low(),
            is_rising: true,
        }
    }

    /// Advance over `bars[i]` (i >= 1), returning `(sar, is_reversal)`.
    pub(crate) fn advance<B: PriceBar>(
        &mut self,
        bars: &[B],
        i: usize,
        params: &SarParams,
    ) -> (Decimal, bool) {
        let step = if self.is_rising {
            self.advance_rising(bars, i, params)
        } else {
            self.advance_falling(bars, i, params)
        };
        self.prior_sar = step.0;
        step
    }

    fn advance_rising<B: PriceBar>(
        &mut self,
        bars: &[B],
        i: usize,
        params: &SarParams,
    ) -> (Decimal, bool) {
        let bar = &bars[i];
        let candidate =
            self.prior_sar + self.acceleration_factor * (self.extreme_point - self.prior_sar);

        // turn down
        if bar.low() < candidate {
            let sar = self.extreme_point;
            self.is_rising = false;
            self.acceleration_factor = params.initial_step;
            self.extreme_point = bar.low();
            return (sar, true);
        }

        // SAR may not sit above either of the last two lows
        let sar = if i >= 2 {
            candidate.min(bars[i - 1].low()).min(bars[i - 2].low())
        } else {
            candidate
        };

        if bar.high() > self.extreme_point {
            self.extreme_point = bar.high();
            self.accelerate(params);
        }
        (sar, false)
    }

    fn advance_falling<B: PriceBar>(
        &mut self,
        bars: &[B],
        i: usize,
        params: &SarParams,
    ) -> (Decimal, bool) {
        let bar = &bars[i];
        let candidate =
            self.prior_sar - self.acceleration_factor * (self.prior_sar - self.extreme_point);

        // turn up
        if bar.high() > candidate {
            let sar = self.extreme_point;
            self.is_rising = true;
            self.acceleration_factor = params.initial_step;
            self.extreme_point = bar.high();
            return (sar, true);
        }

        // SAR may not sit below either of the last two highs
        let sar = if i >= 2 {
            candidate.max(bars[i - 1].high()).max(bars[i - 2].high())
        } else {
            candidate
        };

        if bar.low() < self.extreme_point {
            self.extreme_point = bar.low();
            self.accelerate(params);
        }
        (sar, false)
    }

    fn accelerate(&mut self, params: &SarParams) {
        self.acceleration_factor =
            (self.acceleration_factor + params.acceleration_step).min(params.max_acceleration_factor);
    }
}

/// First pass: raw results from the recurrence, before the lead-in is
/// invalidated. Returns an empty vector for empty input.
pub(crate) fn forward_pass<B: PriceBar>(bars: &[B], params: &SarParams) -> Vec<SarResult> {
    let mut results = Vec::with_capacity(bars.len());
    let Some(first) = bars.first() else {
        return results;
    };

    results.push(SarResult::unestablished(first.timestamp()));
    let mut state = RecurrenceState::seed(first, params);

    for i in 1..bars.len() {
        let (sar, is_reversal) = state.advance(bars, i, params);
        results.push(SarResult::established(bars[i].timestamp(), sar, is_reversal));
    }

    results
}

/// Second pass: null out every result up to and including the first
/// reversal. Returns the index of that reversal, or `None` when the series
/// never reverses (nothing is changed in that case).
pub(crate) fn invalidate_lead_in(results: &mut [SarResult]) -> Option<usize> {
    let first = results
        .iter()
        .position(|r| r.is_reversal == Some(true))?;
    for r in &mut results[..=first] {
        r.invalidate();
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::indicators::make_bars;
    use rust_decimal_macros::dec;

    fn params() -> SarParams {
        SarParams::default()
    }

    fn scenario_bars() -> Vec<Bar> {
        make_bars(&[
            (dec!(10), dec!(9)),
            (dec!(11), dec!(9.5)),
            (dec!(10.5), dec!(10)),
            (dec!(9), dec!(8.5)),
        ])
    }

    #[test]
    fn default_params_match_standard_variant() {
        let p = SarParams::default();
        assert_eq!(p.acceleration_step, dec!(0.02));
        assert_eq!(p.max_acceleration_factor, dec!(0.2));
        assert_eq!(p.initial_step, dec!(0.02));
        assert!(p.validate().is_ok());
        assert_eq!(ParabolicSar::default_params().params(), &p);
    }

    #[test]
    fn name_encodes_params() {
        let psar = ParabolicSar::new(SarParams::extended(dec!(0.02), dec!(0.2), dec!(0.01))).unwrap();
        assert_eq!(psar.name(), "psar_0.02_0.2_0.01");
        assert_eq!(ParabolicSar::default_params().name(), "psar_0.02_0.2_0.02");
    }

    #[test]
    fn forward_pass_scenario_values() {
        let raw = forward_pass(&scenario_bars(), &params());
        assert_eq!(raw[0].sar, None);
        assert_eq!(raw[0].is_reversal, None);

        // 9 + 0.02 * (10 - 9); no clamp on the second bar
        assert_eq!(raw[1].sar, Some(dec!(9.02)));
        assert_eq!(raw[1].is_reversal, Some(false));

        // candidate 9.02 + 0.04 * (11 - 9.02) = 9.0992, clamped to bar[0].low
        assert_eq!(raw[2].sar, Some(dec!(9)));
        assert_eq!(raw[2].is_reversal, Some(false));

        // candidate 9 + 0.04 * (11 - 9) = 9.08; low 8.5 breaks it
        assert_eq!(raw[3].sar, Some(dec!(11)));
        assert_eq!(raw[3].is_reversal, Some(true));
    }

    #[test]
    fn correction_nulls_through_first_reversal() {
        let mut raw = forward_pass(&scenario_bars(), &params());
        assert_eq!(invalidate_lead_in(&mut raw), Some(3));
        assert!(raw.iter().all(|r| r.sar.is_none() && r.is_reversal.is_none()));
    }

    #[test]
    fn correction_is_noop_without_reversal() {
        let bars = make_bars(&[
            (dec!(10), dec!(9)),
            (dec!(11), dec!(10)),
            (dec!(12), dec!(11)),
        ]);
        let mut raw = forward_pass(&bars, &params());
        let before = raw.clone();
        assert_eq!(invalidate_lead_in(&mut raw), None);
        assert_eq!(raw, before);
    }

    #[test]
    fn forward_pass_empty_input() {
        let bars: Vec<Bar> = Vec::new();
        assert!(forward_pass(&bars, &params()).is_empty());
    }

    #[test]
    fn state_seeds_from_first_bar() {
        let bars = scenario_bars();
        let state = RecurrenceState::seed(&bars[0], &params());
        assert_eq!(state.extreme_point, dec!(10));
        assert_eq!(state.prior_sar, dec!(9));
        assert_eq!(state.acceleration_factor, dec!(0.02));
        assert!(state.is_rising);
    }

    #[test]
    fn af_grows_on_new_extreme_and_resets_on_reversal() {
        let bars = scenario_bars();
        let p = params();
        let mut state = RecurrenceState::seed(&bars[0], &p);

        state.advance(&bars, 1, &p);
        assert_eq!(state.acceleration_factor, dec!(0.04));
        assert_eq!(state.extreme_point, dec!(11));

        // no new high: AF unchanged
        state.advance(&bars, 2, &p);
        assert_eq!(state.acceleration_factor, dec!(0.04));
        assert_eq!(state.prior_sar, dec!(9));

        state.advance(&bars, 3, &p);
        assert!(!state.is_rising);
        assert_eq!(state.acceleration_factor, p.initial_step);
        assert_eq!(state.extreme_point, dec!(8.5));
        assert_eq!(state.prior_sar, dec!(11));
    }

    #[test]
    fn af_is_capped() {
        let rows: Vec<(Decimal, Decimal)> = (0..30)
            .map(|i| {
                let base = Decimal::from(100 + i);
                (base + dec!(1), base - dec!(0.5))
            })
            .collect();
        let bars = make_bars(&rows);
        let p = SarParams::standard(dec!(0.02), dec!(0.1));
        let mut state = RecurrenceState::seed(&bars[0], &p);
        for i in 1..bars.len() {
            state.advance(&bars, i, &p);
            assert!(state.acceleration_factor <= p.max_acceleration_factor);
        }
        assert_eq!(state.acceleration_factor, dec!(0.1));
    }

    #[test]
    fn downtrend_branch_mirrors_uptrend() {
        // Reverse on bar 1, then fall with lower lows.
        let bars = make_bars(&[
            (dec!(10), dec!(9)),
            (dec!(9.5), dec!(8)),
            (dec!(9), dec!(7.5)),
            (dec!(8.5), dec!(7)),
            (dec!(8), dec!(6.5)),
        ]);
        let p = params();
        let raw = forward_pass(&bars, &p);

        // bar 1: candidate 9.02 > low 8 -> reversal, SAR = EP 10
        assert_eq!(raw[1].sar, Some(dec!(10)));
        assert_eq!(raw[1].is_reversal, Some(true));

        // bar 2: candidate 10 - 0.02 * (10 - 8) = 9.96, clamped up to max(9.96, 9.5, 10) = 10
        assert_eq!(raw[2].sar, Some(dec!(10)));
        assert_eq!(raw[2].is_reversal, Some(false));

        // bar 3: EP 7.5, AF 0.04: 10 - 0.04 * 2.5 = 9.9; highs 9 and 9.5 -> 9.9
        assert_eq!(raw[3].sar, Some(dec!(9.9)));

        // bar 4: EP 7, AF 0.06: 9.9 - 0.06 * 2.9 = 9.726
        assert_eq!(raw[4].sar, Some(dec!(9.726)));
        assert!(raw[2..].iter().all(|r| r.is_reversal == Some(false)));
    }

    #[test]
    fn clamp_not_applied_on_second_bar() {
        let bars = make_bars(&[(dec!(20), dec!(9)), (dec!(21), dec!(19))]);
        let raw = forward_pass(&bars, &params());
        // 9 + 0.02 * 11 = 9.22 sits above bar[0].low and is left as-is
        assert_eq!(raw[1].sar, Some(dec!(9.22)));
    }

    #[test]
    fn compute_rejects_single_bar() {
        let bars = make_bars(&[(dec!(10), dec!(9))]);
        let err = ParabolicSar::default_params().compute(&bars).unwrap_err();
        assert_eq!(
            err,
            SarError::InsufficientData {
                found: 1,
                required: 2
            }
        );
    }

    #[test]
    fn validate_order_and_names() {
        let cases = [
            (SarParams::extended(dec!(0), dec!(0.2), dec!(0.02)), "accelerationStep"),
            (SarParams::extended(dec!(-0.01), dec!(0.2), dec!(0.02)), "accelerationStep"),
            (SarParams::extended(dec!(0.02), dec!(0), dec!(0.02)), "maxAccelerationFactor"),
            (SarParams::extended(dec!(0.3), dec!(0.2), dec!(0.02)), "accelerationStep"),
            (SarParams::extended(dec!(0.02), dec!(0.2), dec!(0)), "initialStep"),
            (SarParams::extended(dec!(0.02), dec!(0.2), dec!(0.2)), "initialStep"),
            (SarParams::extended(dec!(0.02), dec!(0.2), dec!(0.25)), "initialStep"),
        ];
        for (params, expected) in cases {
            let err = ParabolicSar::new(params).unwrap_err();
            assert_eq!(err.parameter(), Some(expected), "{params:?}");
        }
    }

    #[test]
    fn standard_variant_with_step_equal_to_max_is_rejected() {
        // initial AF follows the step and so equals the max
        let err = SarParams::standard(dec!(0.2), dec!(0.2)).validate().unwrap_err();
        assert_eq!(err.parameter(), Some("initialStep"));
    }

    #[test]
    fn params_from_toml_default_initial_to_step() {
        let p: SarParams = toml::from_str("acceleration_step = 0.03\nmax_acceleration_factor = 0.3\n").unwrap();
        assert_eq!(p, SarParams::standard(dec!(0.03), dec!(0.3)));

        let p: SarParams = toml::from_str("initial_step = 0.01\n").unwrap();
        assert_eq!(p, SarParams::extended(dec!(0.02), dec!(0.2), dec!(0.01)));
    }

    #[test]
    fn params_reject_unknown_fields() {
        assert!(toml::from_str::<SarParams>("step = 0.02\n").is_err());
    }

    mod af_properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_rows() -> impl Strategy<Value = Vec<(Decimal, Decimal)>> {
            prop::collection::vec((500i64..5_000, 0i64..300), 2..80).prop_map(|rows| {
                rows.into_iter()
                    .map(|(low, range)| (Decimal::new(low + range, 1), Decimal::new(low, 1)))
                    .collect()
            })
        }

        proptest! {
            /// AF stays within [initial, max] and restarts at the initial value
            /// on every reversal.
            #[test]
            fn af_bounded_and_reset(rows in arb_rows(), step in 1i64..=10, max in 11i64..=40, initial in 1i64..=10) {
                let p = SarParams::extended(
                    Decimal::new(step, 2),
                    Decimal::new(max, 2),
                    Decimal::new(initial, 2),
                );
                prop_assert!(p.validate().is_ok());

                let bars = make_bars(&rows);
                let mut state = RecurrenceState::seed(&bars[0], &p);
                for i in 1..bars.len() {
                    let was_rising = state.is_rising;
                    let (_, reversed) = state.advance(&bars, i, &p);
                    prop_assert!(state.acceleration_factor <= p.max_acceleration_factor);
                    prop_assert!(state.acceleration_factor >= p.initial_step);
                    prop_assert_eq!(reversed, was_rising != state.is_rising);
                    if reversed {
                        prop_assert_eq!(state.acceleration_factor, p.initial_step);
                    }
                }
            }
        }
    }
}
