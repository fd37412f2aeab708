use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::types::Money;
use crate::EngineResult;

/// Whether a synergy driver adds revenue or removes cost. Both stack into
/// the same cash-flow schedule; the split is kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynergyCategory {
    Cost,
    Revenue,
}

/// How a driver ramps from zero to its steady-state amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RampShape {
    /// Fraction min(y, R)/R of the steady state in year y.
    #[default]
    Linear,
    /// Nothing until the ramp completes, then the full amount.
    Step,
    /// Smoothstep 3t^2 - 2t^3 over the ramp, slow-in slow-out.
    SCurve,
}

/// A named cost or revenue synergy with a steady-state annual amount and
/// a ramp-up duration in years.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyDriver {
    pub name: String,
    pub category: SynergyCategory,
    /// Annual amount once fully realized.
    pub steady_state_amount: Money,
    /// Years to reach full realization (>= 1).
    pub ramp_years: u32,
    #[serde(default)]
    pub shape: RampShape,
}

/// Undiscounted combined synergy cash flow for one year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyCashFlow {
    pub year: u32,
    pub cash_flow: Money,
}

/// Realized fraction of the steady state in year `year` (1-based).
fn ramp_fraction(year: u32, ramp_years: u32, shape: &RampShape) -> Decimal {
    let capped = year.min(ramp_years);
    let t = Decimal::from(capped) / Decimal::from(ramp_years);
    match shape {
        RampShape::Linear => t,
        RampShape::Step => {
            if year >= ramp_years {
                Decimal::ONE
            } else {
                Decimal::ZERO
            }
        }
        RampShape::SCurve => {
            let three = Decimal::from(3);
            let two = Decimal::from(2);
            t * t * (three - two * t)
        }
    }
}

/// Build the combined ramp-weighted synergy cash-flow schedule.
///
/// Schedule length = max(valuation horizon, longest ramp across drivers).
/// A driver whose ramp runs past the horizon is never truncated; it raises
/// a horizon-mismatch warning so the caller can reconcile the two horizons.
pub fn build_schedule(
    drivers: &[SynergyDriver],
    horizon: u32,
    warnings: &mut Vec<String>,
) -> EngineResult<Vec<SynergyCashFlow>> {
    for driver in drivers {
        if driver.ramp_years == 0 {
            return Err(ValuationError::Configuration {
                field: "ramp_years".into(),
                reason: format!("Driver '{}' must ramp over at least one year", driver.name),
            });
        }
    }

    let max_ramp = drivers.iter().map(|d| d.ramp_years).max().unwrap_or(0);
    let length = horizon.max(max_ramp);

    for driver in drivers {
        if driver.ramp_years > horizon {
            warnings.push(format!(
                "Horizon mismatch: driver '{}' ramps over {} years, beyond the {horizon}-year \
                 valuation horizon; schedule extended rather than truncated",
                driver.name, driver.ramp_years
            ));
        }
    }

    let schedule = (1..=length)
        .map(|year| {
            let cash_flow = drivers
                .iter()
                .map(|d| d.steady_state_amount * ramp_fraction(year, d.ramp_years, &d.shape))
                .sum();
            SynergyCashFlow { year, cash_flow }
        })
        .collect();

    Ok(schedule)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
