use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::types::Rate;
use crate::EngineResult;

/// Shape of a convergence schedule between a current and a terminal value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ConvergenceShape {
    /// Straight-line interpolation.
    #[default]
    Linear,
    /// Caller-supplied per-year weights in [0, 1]. A weight of 0 holds the
    /// current value, 1 reaches the terminal value. Length must match the
    /// span being interpolated.
    Custom(Vec<Decimal>),
}

/// Interpolate from `current` to `target` over `steps` years, inclusive of
/// the starting value: year 1 sits at `current`, the final year at `target`.
///
/// A single step returns `current` only (the degenerate one-year horizon).
pub fn convergence_path(
    current: Decimal,
    target: Decimal,
    steps: u32,
    shape: &ConvergenceShape,
) -> EngineResult<Vec<Decimal>> {
    if steps == 0 {
        return Err(ValuationError::Configuration {
            field: "steps".into(),
            reason: "Convergence path requires at least one step".into(),
        });
    }
    if steps == 1 {
        return Ok(vec![current]);
    }

    let span = current - target;
    match shape {
        ConvergenceShape::Linear => {
            let denom = Decimal::from(steps - 1);
            Ok((0..steps)
                .map(|k| current - span * Decimal::from(k) / denom)
                .collect())
        }
        ConvergenceShape::Custom(weights) => {
            let weights = checked_weights(weights, steps as usize)?;
            Ok(weights.iter().map(|w| current - span * w).collect())
        }
    }
}

/// Interpolate from `current` to `target` over `steps` years, exclusive of
/// the starting value: the first year already moves off `current` and the
/// final year lands exactly on `target`.
///
/// Used for transition phases that follow a hold period, mirroring the
/// hold-then-glide converger of the growth schedule.
pub fn transition_path(
    current: Decimal,
    target: Decimal,
    steps: u32,
    shape: &ConvergenceShape,
) -> EngineResult<Vec<Decimal>> {
    if steps == 0 {
        return Ok(Vec::new());
    }

    let span = current - target;
    match shape {
        ConvergenceShape::Linear => {
            let denom = Decimal::from(steps);
            Ok((1..=steps)
                .map(|k| current - span * Decimal::from(k) / denom)
                .collect())
        }
        ConvergenceShape::Custom(weights) => {
            let weights = checked_weights(weights, steps as usize)?;
            Ok(weights.iter().map(|w| current - span * w).collect())
        }
    }
}

/// Cumulative discount factors for a year-varying rate schedule:
/// factor(y) = product of 1/(1 + rate(i)) for i = 1..y.
///
/// Each year compounds at its own rate; this is not a flat exponent.
pub fn cumulative_discount_factors(rates: &[Rate]) -> EngineResult<Vec<Rate>> {
    let mut factors = Vec::with_capacity(rates.len());
    let mut running = Decimal::ONE;
    for (idx, rate) in rates.iter().enumerate() {
        let one_plus = Decimal::ONE + rate;
        if one_plus <= Decimal::ZERO {
            return Err(ValuationError::InvalidRate(format!(
                "Discount rate at year {} must be greater than -100%, got {rate}",
                idx + 1
            )));
        }
        running /= one_plus;
        factors.push(running);
    }
    Ok(factors)
}

/// Value for a given year index from a per-year schedule. When the schedule
/// is shorter than the projection, the last value is carried forward.
pub fn value_for_year<T: Clone>(schedule: &[T], year_idx: usize) -> Option<T> {
    if year_idx < schedule.len() {
        Some(schedule[year_idx].clone())
    } else {
        schedule.last().cloned()
    }
}

fn checked_weights(weights: &[Decimal], expected: usize) -> EngineResult<&[Decimal]> {
    if weights.len() != expected {
        return Err(ValuationError::Configuration {
            field: "shape".into(),
            reason: format!(
                "Custom convergence weights must have length {expected}, got {}",
                weights.len()
            ),
        });
    }
    for w in weights {
        if *w < Decimal::ZERO || *w > Decimal::ONE {
            return Err(ValuationError::Configuration {
                field: "shape".into(),
                reason: format!("Convergence weight {w} outside [0, 1]"),
            });
        }
    }
    Ok(weights)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
