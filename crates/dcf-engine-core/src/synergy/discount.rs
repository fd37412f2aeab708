use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::schedule::{cumulative_discount_factors, value_for_year};
use crate::types::{Money, Rate};
use crate::EngineResult;

use super::schedule::SynergyCashFlow;

/// Discount-rate source for the synergy schedule. Synergies accrue to the
/// buyer, so the default target WACC can be overridden with the buyer's
/// own rate or full per-year schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum BuyerDiscount {
    /// Reuse the target's year-by-year WACC schedule.
    #[default]
    SameAsTarget,
    /// A single flat rate applied to every year.
    FlatRate(Rate),
    /// Explicit per-year rates; the last rate carries forward when the
    /// synergy schedule outruns it.
    Schedule(Vec<Rate>),
}

/// Discounted synergy cash flow for one year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyScheduleEntry {
    pub year: u32,
    pub cash_flow: Money,
    pub discount_rate: Rate,
    pub discount_factor: Rate,
    pub pv: Money,
}

/// Resolve a `BuyerDiscount` against the target's rate schedule.
pub fn resolve_buyer_rates(
    buyer: &BuyerDiscount,
    target_rates: &[Rate],
) -> EngineResult<Vec<Rate>> {
    let rates = match buyer {
        BuyerDiscount::SameAsTarget => target_rates.to_vec(),
        BuyerDiscount::FlatRate(rate) => vec![*rate],
        BuyerDiscount::Schedule(rates) => rates.clone(),
    };
    if rates.is_empty() {
        return Err(ValuationError::Configuration {
            field: "buyer_discount".into(),
            reason: "Buyer discount schedule must contain at least one rate".into(),
        });
    }
    Ok(rates)
}

/// Discount a synergy cash-flow schedule at the buyer's rates, carrying
/// the last rate forward past the end of the rate schedule. Returns the
/// per-year entries and the total present value.
pub fn discount_schedule(
    schedule: &[SynergyCashFlow],
    buyer_rates: &[Rate],
) -> EngineResult<(Vec<SynergyScheduleEntry>, Money)> {
    if buyer_rates.is_empty() {
        return Err(ValuationError::Configuration {
            field: "buyer_discount".into(),
            reason: "Cannot discount synergies without a rate schedule".into(),
        });
    }

    let rates: Vec<Rate> = (0..schedule.len())
        .map(|idx| value_for_year(buyer_rates, idx).unwrap_or(Decimal::ZERO))
        .collect();
    let factors = cumulative_discount_factors(&rates)?;

    let entries: Vec<SynergyScheduleEntry> = schedule
        .iter()
        .zip(rates.iter().zip(factors.iter()))
        .map(|(cf, (rate, factor))| SynergyScheduleEntry {
            year: cf.year,
            cash_flow: cf.cash_flow,
            discount_rate: *rate,
            discount_factor: *factor,
            pv: cf.cash_flow * factor,
        })
        .collect();

    let total_pv: Money = entries.iter().map(|e| e.pv).sum();
    Ok((entries, total_pv))
}

/// Inputs for a value-weighted post-merger discount rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendedWaccInput {
    pub acquirer_beta: Decimal,
    pub acquirer_equity_value: Money,
    pub target_beta: Decimal,
    pub target_equity_value: Money,
    pub risk_free_rate: Rate,
    pub equity_risk_premium: Rate,
    pub cost_of_debt: Rate,
    pub tax_rate: Rate,
    /// Post-merger debt weight; equity weight is the complement.
    pub debt_weight: Rate,
}

/// WACC of the combined entity: betas blended by standalone equity value,
/// then CAPM cost of equity and after-tax cost of debt mixed at the
/// post-merger capital weights.
pub fn blended_wacc(input: &BlendedWaccInput) -> EngineResult<Rate> {
    let total_equity = input.acquirer_equity_value + input.target_equity_value;
    if total_equity <= Decimal::ZERO {
        return Err(ValuationError::DivisionByZero {
            context: "Combined equity value must be positive to blend betas".into(),
        });
    }
    if input.debt_weight < Decimal::ZERO || input.debt_weight > Decimal::ONE {
        return Err(ValuationError::Configuration {
            field: "debt_weight".into(),
            reason: format!("Debt weight {} outside [0, 1]", input.debt_weight),
        });
    }
    if input.tax_rate < Decimal::ZERO || input.tax_rate > Decimal::ONE {
        return Err(ValuationError::Configuration {
            field: "tax_rate".into(),
            reason: format!("Tax rate {} outside [0, 1]", input.tax_rate),
        });
    }

    let blended_beta = (input.acquirer_beta * input.acquirer_equity_value
        + input.target_beta * input.target_equity_value)
        / total_equity;
    let cost_of_equity = input.risk_free_rate + blended_beta * input.equity_risk_premium;
    let after_tax_kd = input.cost_of_debt * (Decimal::ONE - input.tax_rate);
    let equity_weight = Decimal::ONE - input.debt_weight;

    Ok(input.debt_weight * after_tax_kd + equity_weight * cost_of_equity)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
