use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ValuationError;
use crate::types::{with_metadata, ComputationOutput, Money, ProjectionPeriod, Rate};
use crate::EngineResult;

use super::assumptions::AssumptionSet;
use super::forecast::forecast_cash_flows;
use super::growth::project_growth;
use super::margin_tax::{project_margins, project_tax_rates};
use super::terminal::terminal_value;
use super::wacc_schedule::project_wacc;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fully discounted projection for a single forecast year. Finalized once
/// built; nothing downstream mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub period: ProjectionPeriod,
    pub growth: Rate,
    pub margin: Rate,
    pub tax_rate: Rate,
    pub revenue: Money,
    pub ebit: Money,
    pub nopat: Money,
    pub reinvestment: Money,
    pub fcf: Money,
    pub discount_rate: Rate,
    pub discount_factor: Rate,
    pub pv_fcf: Money,
}

/// Output of a standalone DCF valuation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfOutput {
    /// Year-by-year projections.
    pub projections: Vec<YearlyProjection>,
    /// Undiscounted terminal value at the horizon.
    pub terminal_value: Money,
    /// Terminal value discounted at the final year's cumulative factor.
    pub pv_of_terminal: Money,
    /// Sum of present values of the explicit-period FCFs.
    pub pv_of_fcf: Money,
    /// Total present value = PV(FCFs) + PV(TV).
    pub enterprise_value: Money,
    /// Implied equity value = enterprise value minus net debt (net debt
    /// treated as zero when not supplied).
    pub equity_value: Money,
    /// Implied value per share, when shares outstanding are supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_per_share: Option<Money>,
    /// Terminal value as a fraction of enterprise value.
    pub terminal_value_pct: Rate,
    /// Final-year discount rate used for the perpetuity denominator.
    pub final_discount_rate: Rate,
    /// External classifier score, echoed for ranking only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition_likelihood: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full multi-stage DCF pipeline: growth, margin, and tax
/// convergence paths; year-varying WACC; FCF forecast; terminal value;
/// discounting to present value.
pub fn run_dcf(assumptions: &AssumptionSet) -> EngineResult<ComputationOutput<DcfOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    assumptions.validate(&mut warnings)?;
    let output = run_dcf_pipeline(assumptions, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Multi-stage FCFF DCF (year-varying WACC)",
        assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Pipeline body without the envelope, shared with the synergy composer
/// and the implied-growth solver.
pub(crate) fn run_dcf_pipeline(
    assumptions: &AssumptionSet,
    warnings: &mut Vec<String>,
) -> EngineResult<DcfOutput> {
    let growth = project_growth(assumptions)?;
    let margins = project_margins(assumptions)?;
    let tax_rates = project_tax_rates(assumptions)?;
    let wacc = project_wacc(assumptions, &tax_rates)?;
    let cash_flows = forecast_cash_flows(assumptions, &growth, &margins, &tax_rates)?;

    let last = cash_flows.last().ok_or_else(|| {
        ValuationError::InsufficientData("No projection years generated".into())
    })?;
    let final_rate = wacc.final_rate().ok_or_else(|| {
        ValuationError::InsufficientData("Empty discount-rate schedule".into())
    })?;
    let final_factor = wacc.final_factor().ok_or_else(|| {
        ValuationError::InsufficientData("Empty discount-factor schedule".into())
    })?;

    let tv = terminal_value(last.fcf, assumptions.terminal_growth_rate, final_rate)?;
    let pv_of_terminal = tv * final_factor;

    let projections: Vec<YearlyProjection> = cash_flows
        .into_iter()
        .enumerate()
        .map(|(idx, cf)| {
            let discount_factor = wacc.discount_factors[idx];
            YearlyProjection {
                period: ProjectionPeriod::explicit(cf.year),
                growth: cf.growth,
                margin: cf.margin,
                tax_rate: cf.tax_rate,
                revenue: cf.revenue,
                ebit: cf.ebit,
                nopat: cf.nopat,
                reinvestment: cf.reinvestment,
                fcf: cf.fcf,
                discount_rate: wacc.rates[idx],
                discount_factor,
                pv_fcf: cf.fcf * discount_factor,
            }
        })
        .collect();

    let pv_of_fcf: Money = projections.iter().map(|p| p.pv_fcf).sum();
    let enterprise_value = pv_of_fcf + pv_of_terminal;

    let tv_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        pv_of_terminal / enterprise_value
    };
    if tv_pct > dec!(0.75) {
        warnings.push(format!(
            "Terminal value represents {:.1}% of enterprise value; consider extending the explicit forecast period",
            tv_pct * dec!(100)
        ));
    }

    let equity_value = enterprise_value - assumptions.net_debt.unwrap_or(Decimal::ZERO);
    let value_per_share = match assumptions.shares_outstanding {
        Some(shares) if shares > Decimal::ZERO => Some(equity_value / shares),
        Some(_) => {
            return Err(ValuationError::Configuration {
                field: "shares_outstanding".into(),
                reason: "Shares outstanding must be positive".into(),
            })
        }
        None => None,
    };

    Ok(DcfOutput {
        projections,
        terminal_value: tv,
        pv_of_terminal,
        pv_of_fcf,
        enterprise_value,
        equity_value,
        value_per_share,
        terminal_value_pct: tv_pct,
        final_discount_rate: final_rate,
        acquisition_likelihood: assumptions.acquisition_likelihood,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ConvergenceShape;
    use crate::types::Currency;
    use crate::valuation::assumptions::{CapitalWeights, GrowthPhases, ReinvestmentBasis};

    /// Flat all-equity scenario: WACC = 0.04 + 1.0 * 0.06 = 10%.
    fn sample() -> AssumptionSet {
        AssumptionSet {
            horizon: 5,
            base_revenue: dec!(100),
            base_ebit: None,
            initial_growth: dec!(0.10),
            target_growth: dec!(0.10),
            growth_phases: GrowthPhases::default(),
            initial_margin: Some(dec!(0.20)),
            target_margin: dec!(0.20),
            margin_shape: ConvergenceShape::Linear,
            initial_tax_rate: dec!(0.25),
            target_tax_rate: dec!(0.25),
            tax_shape: ConvergenceShape::Linear,
            risk_free_rate: dec!(0.04),
            initial_beta: dec!(1.0),
            target_beta: None,
            equity_risk_premium: vec![dec!(0.06)],
            initial_cost_of_debt: dec!(0.05),
            target_cost_of_debt: None,
            capital_weights: vec![CapitalWeights {
                debt: Decimal::ZERO,
                equity: Decimal::ONE,
            }],
            terminal_growth_rate: dec!(0.02),
            reinvestment: ReinvestmentBasis::default(),
            net_debt: Some(dec!(50)),
            shares_outstanding: Some(dec!(10)),
            market_price: None,
            acquisition_likelihood: None,
            currency: Currency::USD,
        }
    }

    #[test]
    fn test_basic_run() {
        let result = run_dcf(&sample()).unwrap();
        let out = &result.result;

        assert_eq!(out.projections.len(), 5);
        assert_eq!(out.final_discount_rate, dec!(0.10));
        assert!(out.enterprise_value > Decimal::ZERO);
        assert_eq!(out.equity_value, out.enterprise_value - dec!(50));
        assert_eq!(
            out.value_per_share.unwrap(),
            out.equity_value / dec!(10)
        );
    }

    #[test]
    fn test_year_one_fcf_and_pv() {
        let result = run_dcf(&sample()).unwrap();
        let y1 = &result.result.projections[0];
        // Revenue 110, EBIT 22, NOPAT 16.5, no reinvestment
        assert_eq!(y1.fcf, dec!(16.500));
        assert_eq!(y1.discount_rate, dec!(0.10));
        assert_eq!(y1.pv_fcf, y1.fcf * y1.discount_factor);
    }

    #[test]
    fn test_totals_are_consistent() {
        let result = run_dcf(&sample()).unwrap();
        let out = &result.result;
        let pv_sum: Money = out.projections.iter().map(|p| p.pv_fcf).sum();
        assert_eq!(out.pv_of_fcf, pv_sum);
        assert_eq!(out.enterprise_value, out.pv_of_fcf + out.pv_of_terminal);
        assert!(out.terminal_value_pct > Decimal::ZERO);
        assert!(out.terminal_value_pct < Decimal::ONE);
    }

    #[test]
    fn test_no_bridge_data_still_succeeds() {
        let mut a = sample();
        a.net_debt = None;
        a.shares_outstanding = None;
        let result = run_dcf(&a).unwrap();
        let out = &result.result;
        assert_eq!(out.equity_value, out.enterprise_value);
        assert!(out.value_per_share.is_none());
    }

    #[test]
    fn test_zero_shares_rejected() {
        let mut a = sample();
        a.shares_outstanding = Some(Decimal::ZERO);
        assert!(run_dcf(&a).is_err());
    }

    #[test]
    fn test_terminal_growth_above_wacc_rejected() {
        let mut a = sample();
        a.terminal_growth_rate = dec!(0.12);
        let result = run_dcf(&a);
        assert!(matches!(result.unwrap_err(), ValuationError::InvalidRate(_)));
    }

    #[test]
    fn test_likelihood_echoed_not_consumed() {
        let mut a = sample();
        let baseline = run_dcf(&a).unwrap().result.enterprise_value;
        a.acquisition_likelihood = Some(dec!(0.85));
        let result = run_dcf(&a).unwrap();
        assert_eq!(result.result.acquisition_likelihood, Some(dec!(0.85)));
        // The score must never move the valuation
        assert_eq!(result.result.enterprise_value, baseline);
    }

    #[test]
    fn test_methodology_string() {
        let result = run_dcf(&sample()).unwrap();
        assert_eq!(result.methodology, "Multi-stage FCFF DCF (year-varying WACC)");
    }
}
