use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::schedule::{convergence_path, cumulative_discount_factors, value_for_year, ConvergenceShape};
use crate::types::Rate;
use crate::EngineResult;

use super::assumptions::AssumptionSet;

const WEIGHT_TOLERANCE: Decimal = dec!(0.01);

/// Per-year cost of capital and the cumulative discount factors derived
/// from it. Factors compound each year at that year's own rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccSchedule {
    /// Blended discount rate per year.
    pub rates: Vec<Rate>,
    /// Cumulative factor per year: product of 1/(1+rate(i)) for i = 1..y.
    pub discount_factors: Vec<Rate>,
    /// CAPM cost of equity per year.
    pub cost_of_equity: Vec<Rate>,
    /// After-tax cost of debt per year.
    pub after_tax_cost_of_debt: Vec<Rate>,
}

impl WaccSchedule {
    pub fn final_rate(&self) -> Option<Rate> {
        self.rates.last().copied()
    }

    pub fn final_factor(&self) -> Option<Rate> {
        self.discount_factors.last().copied()
    }
}

/// Project the year-by-year discount rate.
///
/// For each year: Ke = Rf + beta(y) * ERP(y), Kd_at = Kd(y) * (1 - tax(y)),
/// rate = We(y) * Ke + Wd(y) * Kd_at. Beta and pre-tax cost of debt glide
/// linearly from their current to their projected values; ERP and capital
/// weights are per-year schedules with the last entry carried forward.
///
/// Fails with `InvalidRate` when any projected rate is non-positive or the
/// final-year rate does not exceed the terminal growth rate, which would
/// leave the terminal value undefined.
pub fn project_wacc(
    assumptions: &AssumptionSet,
    tax_rates: &[Rate],
) -> EngineResult<WaccSchedule> {
    let n = assumptions.horizon as usize;
    if tax_rates.len() != n {
        return Err(ValuationError::InsufficientData(format!(
            "Tax rate path has {} years but the horizon is {n}",
            tax_rates.len()
        )));
    }

    let betas = convergence_path(
        assumptions.initial_beta,
        assumptions.ending_beta(),
        assumptions.horizon,
        &ConvergenceShape::Linear,
    )?;
    let debt_costs = convergence_path(
        assumptions.initial_cost_of_debt,
        assumptions.ending_cost_of_debt(),
        assumptions.horizon,
        &ConvergenceShape::Linear,
    )?;

    let mut rates = Vec::with_capacity(n);
    let mut cost_of_equity = Vec::with_capacity(n);
    let mut after_tax_cost_of_debt = Vec::with_capacity(n);

    for year_idx in 0..n {
        let erp = value_for_year(&assumptions.equity_risk_premium, year_idx).ok_or_else(|| {
            ValuationError::Configuration {
                field: "equity_risk_premium".into(),
                reason: "ERP schedule must contain at least one year".into(),
            }
        })?;
        let weights = value_for_year(&assumptions.capital_weights, year_idx).ok_or_else(|| {
            ValuationError::Configuration {
                field: "capital_weights".into(),
                reason: "Capital-structure weight schedule must contain at least one year".into(),
            }
        })?;

        if weights.debt < Decimal::ZERO || weights.equity < Decimal::ZERO {
            return Err(ValuationError::Configuration {
                field: "capital_weights".into(),
                reason: format!("Weights for year {} cannot be negative", year_idx + 1),
            });
        }
        let weight_sum = weights.debt + weights.equity;
        if (weight_sum - Decimal::ONE).abs() > WEIGHT_TOLERANCE {
            return Err(ValuationError::Configuration {
                field: "capital_weights".into(),
                reason: format!(
                    "Weights for year {} must sum to 1.0, got {weight_sum}",
                    year_idx + 1
                ),
            });
        }

        let ke = assumptions.risk_free_rate + betas[year_idx] * erp;
        let kd_at = debt_costs[year_idx] * (Decimal::ONE - tax_rates[year_idx]);
        let rate = weights.equity * ke + weights.debt * kd_at;

        if rate <= Decimal::ZERO {
            return Err(ValuationError::InvalidRate(format!(
                "Discount rate for year {} is non-positive ({rate})",
                year_idx + 1
            )));
        }

        cost_of_equity.push(ke);
        after_tax_cost_of_debt.push(kd_at);
        rates.push(rate);
    }

    // The perpetuity denominator must be positive at the horizon.
    let final_rate = rates[n - 1];
    if final_rate <= assumptions.terminal_growth_rate {
        return Err(ValuationError::InvalidRate(format!(
            "Final-year discount rate ({final_rate}) must exceed the terminal growth rate ({}) \
             for the terminal value to be defined",
            assumptions.terminal_growth_rate
        )));
    }

    let discount_factors = cumulative_discount_factors(&rates)?;

    Ok(WaccSchedule {
        rates,
        discount_factors,
        cost_of_equity,
        after_tax_cost_of_debt,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
