use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ValuationError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::EngineResult;

use super::assumptions::AssumptionSet;
use super::discount::run_dcf_pipeline;

const MAX_ITERATIONS: u32 = 60;
const RELATIVE_TOLERANCE: Decimal = dec!(0.0001);
const GROWTH_LOW: Decimal = Decimal::ZERO;
const GROWTH_HIGH: Decimal = dec!(0.30);

/// Result of back-solving the beginning growth rate implied by the
/// observed market price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpliedGrowthOutput {
    /// Beginning growth rate that reproduces the market price.
    pub implied_growth: Rate,
    /// Per-share value at the solved growth rate.
    pub implied_price: Money,
    /// Observed market price targeted by the solver.
    pub market_price: Money,
    pub iterations: u32,
}

/// Bisect the beginning growth rate in [0, 30%] until the implied share
/// price matches the observed market price.
///
/// Implied price is monotone in the beginning growth rate, so plain
/// bisection suffices. Requires market price and shares outstanding.
pub fn find_implied_growth(
    assumptions: &AssumptionSet,
) -> EngineResult<ComputationOutput<ImpliedGrowthOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    assumptions.validate(&mut warnings)?;

    let target = assumptions.market_price.ok_or_else(|| ValuationError::MissingInput {
        field: "market_price".into(),
        reason: "Implied growth requires an observed market price".into(),
    })?;
    if assumptions.shares_outstanding.is_none() {
        return Err(ValuationError::MissingInput {
            field: "shares_outstanding".into(),
            reason: "Implied growth requires shares outstanding for a per-share value".into(),
        });
    }
    if target <= Decimal::ZERO {
        return Err(ValuationError::Configuration {
            field: "market_price".into(),
            reason: "Market price must be positive".into(),
        });
    }

    let mut low = GROWTH_LOW;
    let mut high = GROWTH_HIGH;
    let mut last_delta = Decimal::MAX;

    for iteration in 1..=MAX_ITERATIONS {
        let mid = (low + high) / dec!(2);

        let mut trial = assumptions.clone();
        trial.initial_growth = mid;

        let mut trial_warnings = Vec::new();
        let output = run_dcf_pipeline(&trial, &mut trial_warnings)?;
        let implied = output.value_per_share.ok_or_else(|| {
            ValuationError::InsufficientData("Pipeline produced no per-share value".into())
        })?;

        last_delta = (implied - target) / target;
        if last_delta.abs() < RELATIVE_TOLERANCE {
            let elapsed = start.elapsed().as_micros() as u64;
            return Ok(with_metadata(
                "Implied growth via bisection on beginning growth rate",
                assumptions,
                warnings,
                elapsed,
                ImpliedGrowthOutput {
                    implied_growth: mid,
                    implied_price: implied,
                    market_price: target,
                    iterations: iteration,
                },
            ));
        }

        if implied > target {
            high = mid;
        } else {
            low = mid;
        }
    }

    Err(ValuationError::ConvergenceFailure {
        function: "find_implied_growth".into(),
        iterations: MAX_ITERATIONS,
        last_delta,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
