use rust_decimal::Decimal;

use crate::error::ValuationError;
use crate::schedule::convergence_path;
use crate::types::Rate;
use crate::EngineResult;

use super::assumptions::AssumptionSet;

/// Project the operating margin path, converging monotonically from the
/// starting margin to the terminal margin over the full horizon.
///
/// Negative margins are permitted (loss-making projections are valid).
pub fn project_margins(assumptions: &AssumptionSet) -> EngineResult<Vec<Rate>> {
    let current = assumptions.starting_margin()?;
    convergence_path(
        current,
        assumptions.target_margin,
        assumptions.horizon,
        &assumptions.margin_shape,
    )
}

/// Project the effective tax rate path, converging from the current to the
/// terminal rate. Both endpoints must lie in [0, 1]; interpolated values
/// then stay in range by construction.
pub fn project_tax_rates(assumptions: &AssumptionSet) -> EngineResult<Vec<Rate>> {
    for (field, rate) in [
        ("initial_tax_rate", assumptions.initial_tax_rate),
        ("target_tax_rate", assumptions.target_tax_rate),
    ] {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(ValuationError::Configuration {
                field: field.into(),
                reason: "Tax rate must be between 0 and 1".into(),
            });
        }
    }
    convergence_path(
        assumptions.initial_tax_rate,
        assumptions.target_tax_rate,
        assumptions.horizon,
        &assumptions.tax_shape,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ConvergenceShape;
    use crate::valuation::assumptions::{
        AssumptionSet, CapitalWeights, GrowthPhases, ReinvestmentBasis,
    };
    use crate::types::Currency;
    use rust_decimal_macros::dec;

    fn assumptions(horizon: u32) -> AssumptionSet {
        AssumptionSet {
            horizon,
            base_revenue: dec!(1000),
            base_ebit: None,
            initial_growth: dec!(0.08),
            target_growth: dec!(0.03),
            growth_phases: GrowthPhases::default(),
            initial_margin: Some(dec!(0.15)),
            target_margin: dec!(0.25),
            margin_shape: ConvergenceShape::Linear,
            initial_tax_rate: dec!(0.30),
            target_tax_rate: dec!(0.22),
            tax_shape: ConvergenceShape::Linear,
            risk_free_rate: dec!(0.042),
            initial_beta: dec!(1.0),
            target_beta: None,
            equity_risk_premium: vec![dec!(0.055)],
            initial_cost_of_debt: dec!(0.05),
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
    fn test_margin_converges_to_terminal() {
        let a = assumptions(6);
        let margins = project_margins(&a).unwrap();
        assert_eq!(margins.len(), 6);
        assert_eq!(margins[0], dec!(0.15));
        assert_eq!(margins[5], dec!(0.25));
        for pair in margins.windows(2) {
            assert!(pair[1] > pair[0], "Margin path must be monotone: {pair:?}");
        }
    }

    #[test]
    fn test_tax_converges_downward() {
        let a = assumptions(5);
        let taxes = project_tax_rates(&a).unwrap();
        assert_eq!(taxes[0], dec!(0.30));
        assert_eq!(taxes[4], dec!(0.22));
        assert!(taxes
            .iter()
            .all(|t| *t >= Decimal::ZERO && *t <= Decimal::ONE));
    }

    #[test]
    fn test_horizon_one_returns_beginning_values() {
        let a = assumptions(1);
        assert_eq!(project_margins(&a).unwrap(), vec![dec!(0.15)]);
        assert_eq!(project_tax_rates(&a).unwrap(), vec![dec!(0.30)]);
    }

    #[test]
    fn test_negative_margin_projection_permitted() {
        let mut a = assumptions(4);
        a.initial_margin = Some(dec!(-0.10));
        a.target_margin = dec!(0.05);
        let margins = project_margins(&a).unwrap();
        assert_eq!(margins[0], dec!(-0.10));
        assert_eq!(margins[3], dec!(0.05));
    }

    #[test]
    fn test_tax_endpoint_out_of_range_rejected() {
        let mut a = assumptions(4);
        a.initial_tax_rate = dec!(1.2);
        assert!(project_tax_rates(&a).is_err());
    }

    #[test]
    fn test_margin_from_base_ebit_when_unset() {
        let mut a = assumptions(3);
        a.initial_margin = None;
        a.base_ebit = Some(dec!(120));
        let margins = project_margins(&a).unwrap();
        assert_eq!(margins[0], dec!(0.12));
    }
}
