use dcf_engine_core::schedule::ConvergenceShape;
use dcf_engine_core::types::Currency;
use dcf_engine_core::valuation::assumptions::{
    AssumptionSet, CapitalWeights, GrowthPhases, ReinvestmentBasis,
};
use dcf_engine_core::valuation::discount::run_dcf;
use dcf_engine_core::valuation::implied::find_implied_growth;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Helpers
// ===========================================================================

fn assert_close(actual: Decimal, expected: Decimal, label: &str) {
    let rel = if expected.is_zero() {
        actual.abs()
    } else {
        ((actual - expected) / expected).abs()
    };
    assert!(
        rel < dec!(0.000001),
        "{label}: expected {expected}, got {actual} (relative error {rel})"
    );
}

/// Flat 10% all-equity scenario with closed-form totals:
/// each year's PV(FCF) is exactly 15, EV = 75 + 191.25 = 266.25.
fn flat_ten_percent() -> AssumptionSet {
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

// ===========================================================================
// Standalone DCF
// ===========================================================================

#[test]
fn test_dcf_closed_form_scenario() {
    // Revenue compounds at 10%, NOPAT = revenue * 0.20 * 0.75, and the
    // 10% growth / 10% discount cancellation makes each year's PV exactly
    // 100 * 0.20 * 0.75 = 15.
    let result = run_dcf(&flat_ten_percent()).unwrap();
    let out = &result.result;

    assert_close(out.pv_of_fcf, dec!(75), "PV of explicit FCFs");
    // TV = 24.15765 * 1.02 / 0.08 = 308.0100375; PV = TV / 1.1^5 = 191.25
    assert_close(out.terminal_value, dec!(308.0100375), "terminal value");
    assert_close(out.pv_of_terminal, dec!(191.25), "PV of terminal value");
    assert_close(out.enterprise_value, dec!(266.25), "enterprise value");
    assert_close(out.equity_value, dec!(216.25), "equity value");
    assert_close(out.value_per_share.unwrap(), dec!(21.625), "value per share");
}

#[test]
fn test_dcf_projection_schedule_detail() {
    let result = run_dcf(&flat_ten_percent()).unwrap();
    let projections = &result.result.projections;

    assert_eq!(projections.len(), 5);
    assert_eq!(projections[0].period.year, 1);
    assert_eq!(projections[4].period.year, 5);
    assert_close(projections[0].revenue, dec!(110), "year-1 revenue");
    assert_close(projections[4].revenue, dec!(161.051), "year-5 revenue");
    assert_close(projections[2].fcf, dec!(19.965), "year-3 FCF");
    for p in projections {
        assert_close(p.pv_fcf, dec!(15), "per-year PV under the 10/10 cancellation");
    }
}

#[test]
fn test_dcf_is_deterministic() {
    let a = flat_ten_percent();
    let first = run_dcf(&a).unwrap();
    let second = run_dcf(&a).unwrap();
    // Identical inputs must produce identical results (timing metadata aside)
    assert_eq!(
        serde_json::to_value(&first.result).unwrap(),
        serde_json::to_value(&second.result).unwrap()
    );
    assert_eq!(first.warnings, second.warnings);
}

#[test]
fn test_higher_growth_raises_value() {
    let base = run_dcf(&flat_ten_percent()).unwrap().result.enterprise_value;
    let mut a = flat_ten_percent();
    a.initial_growth = dec!(0.14);
    a.target_growth = dec!(0.14);
    let faster = run_dcf(&a).unwrap().result.enterprise_value;
    assert!(faster > base);
}

#[test]
fn test_higher_discount_rate_lowers_value() {
    let base = run_dcf(&flat_ten_percent()).unwrap().result.enterprise_value;
    let mut a = flat_ten_percent();
    a.initial_beta = dec!(1.5);
    let riskier = run_dcf(&a).unwrap().result.enterprise_value;
    assert!(riskier < base);
}

#[test]
fn test_growth_phase_structure_flows_through() {
    // 2-year hold at 12%, then glide to 4% by the final year
    let mut a = flat_ten_percent();
    a.initial_growth = dec!(0.12);
    a.target_growth = dec!(0.04);
    a.growth_phases = GrowthPhases {
        hold_years: Some(2),
        transition_years: None,
        shape: ConvergenceShape::Linear,
    };
    let projections = run_dcf(&a).unwrap().result.projections;
    assert_eq!(projections[0].growth, dec!(0.12));
    assert_eq!(projections[1].growth, dec!(0.12));
    assert!(projections[2].growth < dec!(0.12));
    assert_close(projections[4].growth, dec!(0.04), "final-year growth");
}

#[test]
fn test_reinvestment_reduces_fcf() {
    let mut a = flat_ten_percent();
    a.reinvestment = ReinvestmentBasis::RateOnIncrementalRevenue(dec!(0.50));
    let result = run_dcf(&a).unwrap();
    let y1 = &result.result.projections[0];
    // Incremental revenue 10, reinvestment 5, FCF = 16.5 - 5
    assert_close(y1.reinvestment, dec!(5), "year-1 reinvestment");
    assert_close(y1.fcf, dec!(11.5), "year-1 FCF net of reinvestment");
}

// ===========================================================================
// Warnings and the output envelope
// ===========================================================================

#[test]
fn test_aggressive_terminal_growth_warns_but_succeeds() {
    let mut a = flat_ten_percent();
    a.terminal_growth_rate = dec!(0.045);
    let result = run_dcf(&a).unwrap();
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("Terminal growth")));
}

#[test]
fn test_envelope_echoes_assumptions() {
    let result = run_dcf(&flat_ten_percent()).unwrap();
    assert_eq!(result.assumptions["horizon"], 5);
    assert_eq!(result.metadata.precision, "rust_decimal_128bit");
    assert!(!result.metadata.version.is_empty());
}

// ===========================================================================
// Implied growth
// ===========================================================================

#[test]
fn test_implied_growth_round_trip() {
    // Price at a known 9% beginning growth, then solve it back
    let mut priced = flat_ten_percent();
    priced.initial_growth = dec!(0.09);
    priced.target_growth = dec!(0.03);
    let price = run_dcf(&priced).unwrap().result.value_per_share.unwrap();

    let mut a = flat_ten_percent();
    a.target_growth = dec!(0.03);
    a.market_price = Some(price);
    let solved = find_implied_growth(&a).unwrap().result;

    assert!((solved.implied_growth - dec!(0.09)).abs() < dec!(0.005));
    let rel = ((solved.implied_price - price) / price).abs();
    assert!(rel < dec!(0.0001));
}
