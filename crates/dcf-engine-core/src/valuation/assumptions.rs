use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::schedule::ConvergenceShape;
use crate::types::{Currency, Money, Rate};
use crate::EngineResult;

/// Per-year capital-structure weights (market value basis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalWeights {
    pub debt: Rate,
    pub equity: Rate,
}

/// How reinvestment is derived for each forecast year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReinvestmentBasis {
    /// Reinvestment(year) = incremental revenue * rate.
    RateOnIncrementalRevenue(Rate),
    /// Directly supplied per-year amounts; the last value is carried
    /// forward when the schedule is shorter than the horizon.
    Schedule(Vec<Money>),
}

impl Default for ReinvestmentBasis {
    fn default() -> Self {
        ReinvestmentBasis::RateOnIncrementalRevenue(Decimal::ZERO)
    }
}

/// Growth phase layout: hold the beginning rate, glide to the target rate,
/// then hold the target until the horizon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrowthPhases {
    /// Years held at the beginning growth rate. Default: horizon / 2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_years: Option<u32>,
    /// Years spent interpolating toward the target rate. Default: the
    /// remainder of the horizon after the hold phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_years: Option<u32>,
    /// Interpolation shape across the transition phase.
    #[serde(default)]
    pub shape: ConvergenceShape,
}

/// Validated input parameters for a full valuation run.
///
/// Immutable record owned by the caller. All rates are fractions
/// (0.05 = 5%), never percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssumptionSet {
    /// Explicit forecast horizon in years (>= 1).
    pub horizon: u32,
    /// Base (Year 0) revenue.
    pub base_revenue: Money,
    /// Base (Year 0) EBIT. Used to derive the starting operating margin
    /// when `initial_margin` is not supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_ebit: Option<Money>,

    // --- Growth ---
    /// Revenue growth rate during the initial high-growth phase.
    pub initial_growth: Rate,
    /// Growth rate reached at the end of the transition phase.
    pub target_growth: Rate,
    /// Phase boundaries and interpolation shape for the growth schedule.
    #[serde(default)]
    pub growth_phases: GrowthPhases,

    // --- Margin & tax ---
    /// Starting operating margin. Falls back to `base_ebit / base_revenue`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_margin: Option<Rate>,
    /// Terminal operating margin. May be negative (loss-making projection).
    pub target_margin: Rate,
    #[serde(default)]
    pub margin_shape: ConvergenceShape,
    /// Starting effective tax rate, in [0, 1].
    pub initial_tax_rate: Rate,
    /// Terminal effective tax rate, in [0, 1].
    pub target_tax_rate: Rate,
    #[serde(default)]
    pub tax_shape: ConvergenceShape,

    // --- Cost of capital ---
    /// Risk-free rate (e.g. 10-year government bond yield).
    pub risk_free_rate: Rate,
    /// Levered beta today.
    pub initial_beta: Decimal,
    /// Beta at the end of the horizon; defaults to `initial_beta`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_beta: Option<Decimal>,
    /// Equity risk premium per year; the last value is carried forward.
    pub equity_risk_premium: Vec<Rate>,
    /// Pre-tax cost of debt today.
    pub initial_cost_of_debt: Rate,
    /// Pre-tax cost of debt at the end of the horizon; defaults to the
    /// initial value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_cost_of_debt: Option<Rate>,
    /// Capital-structure weights per year; the last entry is carried
    /// forward when shorter than the horizon.
    pub capital_weights: Vec<CapitalWeights>,

    // --- Terminal & reinvestment ---
    /// Perpetuity growth rate beyond the horizon. Must stay below the
    /// final-year discount rate.
    pub terminal_growth_rate: Rate,
    #[serde(default)]
    pub reinvestment: ReinvestmentBasis,

    // --- Equity bridge & reporting (all optional) ---
    /// Net debt (debt minus cash) for the equity bridge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_debt: Option<Money>,
    /// Diluted shares outstanding for per-share value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<Decimal>,
    /// Observed market price per share, for margin-of-safety reporting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_price: Option<Money>,
    /// Acquisition-likelihood score in [0, 1] from the external
    /// classifier. Echoed into reports for ranking; never used in any
    /// valuation formula.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition_likelihood: Option<Decimal>,
    #[serde(default)]
    pub currency: Currency,
}

impl AssumptionSet {
    /// Validate the structural invariants of the assumption set.
    ///
    /// Reasonableness issues (terminal growth above the customary cap,
    /// betas outside typical bounds) are pushed as warnings, not errors.
    pub fn validate(&self, warnings: &mut Vec<String>) -> EngineResult<()> {
        if self.horizon == 0 {
            return Err(ValuationError::Configuration {
                field: "horizon".into(),
                reason: "Forecast horizon must be at least 1 year".into(),
            });
        }
        if self.base_revenue <= Decimal::ZERO {
            return Err(ValuationError::Configuration {
                field: "base_revenue".into(),
                reason: "Base revenue must be positive".into(),
            });
        }
        for (field, rate) in [
            ("initial_tax_rate", self.initial_tax_rate),
            ("target_tax_rate", self.target_tax_rate),
        ] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(ValuationError::Configuration {
                    field: field.into(),
                    reason: "Tax rate must be between 0 and 1".into(),
                });
            }
        }
        if self.risk_free_rate < Decimal::ZERO {
            return Err(ValuationError::Configuration {
                field: "risk_free_rate".into(),
                reason: "Risk-free rate cannot be negative".into(),
            });
        }
        if self.equity_risk_premium.is_empty() {
            return Err(ValuationError::Configuration {
                field: "equity_risk_premium".into(),
                reason: "ERP schedule must contain at least one year".into(),
            });
        }
        if self.equity_risk_premium.iter().any(|e| *e < Decimal::ZERO) {
            return Err(ValuationError::Configuration {
                field: "equity_risk_premium".into(),
                reason: "Equity risk premium cannot be negative".into(),
            });
        }
        if self.capital_weights.is_empty() {
            return Err(ValuationError::Configuration {
                field: "capital_weights".into(),
                reason: "Capital-structure weight schedule must contain at least one year".into(),
            });
        }
        if self.initial_cost_of_debt < Decimal::ZERO
            || self.target_cost_of_debt.is_some_and(|kd| kd < Decimal::ZERO)
        {
            return Err(ValuationError::Configuration {
                field: "cost_of_debt".into(),
                reason: "Cost of debt cannot be negative".into(),
            });
        }
        if let ReinvestmentBasis::RateOnIncrementalRevenue(rate) = self.reinvestment {
            if rate < Decimal::ZERO {
                return Err(ValuationError::Configuration {
                    field: "reinvestment".into(),
                    reason: "Reinvestment rate cannot be negative".into(),
                });
            }
        }
        if let Some(score) = self.acquisition_likelihood {
            if score < Decimal::ZERO || score > Decimal::ONE {
                return Err(ValuationError::Configuration {
                    field: "acquisition_likelihood".into(),
                    reason: "Likelihood score must be between 0 and 1".into(),
                });
            }
        }

        if self.terminal_growth_rate > dec!(0.035) {
            warnings.push(format!(
                "Terminal growth rate ({}) exceeds the customary 3.5% cap; verify assumption",
                self.terminal_growth_rate
            ));
        }
        for beta in [self.initial_beta, self.target_beta.unwrap_or(self.initial_beta)] {
            if beta < dec!(0.5) || beta > dec!(2.5) {
                warnings.push(format!(
                    "Beta ({beta}) outside the typical 0.5-2.5 range; verify market data"
                ));
                break;
            }
        }

        Ok(())
    }

    /// Resolve the starting operating margin, deriving it from base EBIT
    /// when not supplied directly.
    pub fn starting_margin(&self) -> EngineResult<Rate> {
        if let Some(margin) = self.initial_margin {
            return Ok(margin);
        }
        match self.base_ebit {
            Some(ebit) if !self.base_revenue.is_zero() => Ok(ebit / self.base_revenue),
            _ => Err(ValuationError::MissingInput {
                field: "initial_margin".into(),
                reason: "Provide either initial_margin or base_ebit".into(),
            }),
        }
    }

    /// Beta at the end of the horizon.
    pub fn ending_beta(&self) -> Decimal {
        self.target_beta.unwrap_or(self.initial_beta)
    }

    /// Pre-tax cost of debt at the end of the horizon.
    pub fn ending_cost_of_debt(&self) -> Rate {
        self.target_cost_of_debt.unwrap_or(self.initial_cost_of_debt)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AssumptionSet {
        AssumptionSet {
            horizon: 5,
            base_revenue: dec!(1000),
            base_ebit: None,
            initial_growth: dec!(0.10),
            target_growth: dec!(0.03),
            growth_phases: GrowthPhases::default(),
            initial_margin: Some(dec!(0.20)),
            target_margin: dec!(0.22),
            margin_shape: ConvergenceShape::Linear,
            initial_tax_rate: dec!(0.25),
            target_tax_rate: dec!(0.25),
            tax_shape: ConvergenceShape::Linear,
            risk_free_rate: dec!(0.042),
            initial_beta: dec!(1.10),
            target_beta: None,
            equity_risk_premium: vec![dec!(0.055)],
            initial_cost_of_debt: dec!(0.055),
            target_cost_of_debt: None,
            capital_weights: vec![CapitalWeights {
                debt: dec!(0.30),
                equity: dec!(0.70),
            }],
            terminal_growth_rate: dec!(0.025),
            reinvestment: ReinvestmentBasis::default(),
            net_debt: None,
            shares_outstanding: None,
            market_price: None,
            acquisition_likelihood: None,
            currency: Currency::USD,
        }
    }

    #[test]
    fn test_valid_assumptions_pass() {
        let mut warnings = Vec::new();
        assert!(sample().validate(&mut warnings).is_ok());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let mut a = sample();
        a.horizon = 0;
        assert!(a.validate(&mut Vec::new()).is_err());
    }

    #[test]
    fn test_negative_revenue_rejected() {
        let mut a = sample();
        a.base_revenue = dec!(-10);
        assert!(a.validate(&mut Vec::new()).is_err());
    }

    #[test]
    fn test_tax_rate_out_of_range_rejected() {
        let mut a = sample();
        a.target_tax_rate = dec!(1.5);
        assert!(a.validate(&mut Vec::new()).is_err());
    }

    #[test]
    fn test_empty_erp_schedule_rejected() {
        let mut a = sample();
        a.equity_risk_premium.clear();
        assert!(a.validate(&mut Vec::new()).is_err());
    }

    #[test]
    fn test_likelihood_out_of_range_rejected() {
        let mut a = sample();
        a.acquisition_likelihood = Some(dec!(1.2));
        assert!(a.validate(&mut Vec::new()).is_err());
    }

    #[test]
    fn test_high_terminal_growth_warns() {
        let mut a = sample();
        a.terminal_growth_rate = dec!(0.05);
        let mut warnings = Vec::new();
        a.validate(&mut warnings).unwrap();
        assert!(warnings.iter().any(|w| w.contains("Terminal growth rate")));
    }

    #[test]
    fn test_extreme_beta_warns() {
        let mut a = sample();
        a.initial_beta = dec!(3.2);
        let mut warnings = Vec::new();
        a.validate(&mut warnings).unwrap();
        assert!(warnings.iter().any(|w| w.contains("Beta")));
    }

    #[test]
    fn test_margin_derived_from_base_ebit() {
        let mut a = sample();
        a.initial_margin = None;
        a.base_ebit = Some(dec!(180));
        assert_eq!(a.starting_margin().unwrap(), dec!(0.18));
    }

    #[test]
    fn test_margin_missing_both_sources() {
        let mut a = sample();
        a.initial_margin = None;
        a.base_ebit = None;
        let err = a.starting_margin().unwrap_err();
        assert!(matches!(err, ValuationError::MissingInput { .. }));
    }
}
