use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use dcf_engine_core::schedule::ConvergenceShape;
use dcf_engine_core::types::Currency;
use dcf_engine_core::valuation::assumptions::{
    AssumptionSet, CapitalWeights, GrowthPhases, ReinvestmentBasis,
};
use dcf_engine_core::valuation::{discount, implied};

use crate::input;

/// Arguments for a standalone DCF valuation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DcfArgs {
    /// Path to a JSON or YAML assumption file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Explicit forecast horizon in years
    #[arg(long, default_value = "5")]
    pub horizon: u32,

    /// Most recent full-year revenue
    #[arg(long)]
    pub base_revenue: Option<Decimal>,

    /// Beginning revenue growth rate (e.g. 0.10 for 10%)
    #[arg(long, alias = "growth")]
    pub initial_growth: Option<Decimal>,

    /// Mature-stage growth rate the projection converges to
    #[arg(long)]
    pub target_growth: Option<Decimal>,

    /// Years the beginning growth rate holds before converging
    #[arg(long)]
    pub hold_years: Option<u32>,

    /// Years the transition phase takes (defaults to the remaining horizon)
    #[arg(long)]
    pub transition_years: Option<u32>,

    /// Beginning operating margin (defaults to base EBIT / base revenue)
    #[arg(long, alias = "margin")]
    pub initial_margin: Option<Decimal>,

    /// Mature-stage operating margin
    #[arg(long)]
    pub target_margin: Option<Decimal>,

    /// Effective tax rate
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Risk-free rate
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Levered beta
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Equity risk premium
    #[arg(long, alias = "erp")]
    pub equity_risk_premium: Option<Decimal>,

    /// Pre-tax cost of debt
    #[arg(long)]
    pub cost_of_debt: Option<Decimal>,

    /// Debt weight in the capital structure (equity weight is the complement)
    #[arg(long, default_value = "0")]
    pub debt_weight: Decimal,

    /// Terminal (perpetuity) growth rate
    #[arg(long, default_value = "0.02")]
    pub terminal_growth: Decimal,

    /// Reinvestment as a fraction of incremental revenue
    #[arg(long)]
    pub reinvestment_rate: Option<Decimal>,

    /// Net debt for the equity bridge
    #[arg(long)]
    pub net_debt: Option<Decimal>,

    /// Diluted shares outstanding
    #[arg(long)]
    pub shares_outstanding: Option<Decimal>,

    /// Observed market price per share
    #[arg(long)]
    pub market_price: Option<Decimal>,
}

/// Arguments for the implied-growth solver
#[derive(Args)]
pub struct ImpliedGrowthArgs {
    /// Path to a JSON or YAML assumption file
    #[arg(long)]
    pub input: Option<String>,

    /// Observed market price per share (overrides the file value)
    #[arg(long)]
    pub market_price: Option<Decimal>,
}

fn assumptions_from_flags(args: &DcfArgs) -> Result<AssumptionSet, Box<dyn std::error::Error>> {
    Ok(AssumptionSet {
        horizon: args.horizon,
        base_revenue: args
            .base_revenue
            .ok_or("--base-revenue is required (or provide --input)")?,
        base_ebit: None,
        initial_growth: args
            .initial_growth
            .ok_or("--initial-growth is required (or provide --input)")?,
        target_growth: args.target_growth.unwrap_or(dec!(0.03)),
        growth_phases: GrowthPhases {
            hold_years: args.hold_years,
            transition_years: args.transition_years,
            shape: ConvergenceShape::Linear,
        },
        initial_margin: Some(
            args.initial_margin
                .ok_or("--initial-margin is required (or provide --input)")?,
        ),
        target_margin: args
            .target_margin
            .or(args.initial_margin)
            .ok_or("--target-margin is required (or provide --input)")?,
        margin_shape: ConvergenceShape::Linear,
        initial_tax_rate: args
            .tax_rate
            .ok_or("--tax-rate is required (or provide --input)")?,
        target_tax_rate: args
            .tax_rate
            .ok_or("--tax-rate is required (or provide --input)")?,
        tax_shape: ConvergenceShape::Linear,
        risk_free_rate: args
            .risk_free_rate
            .ok_or("--risk-free-rate is required (or provide --input)")?,
        initial_beta: args.beta.unwrap_or(dec!(1.0)),
        target_beta: None,
        equity_risk_premium: vec![args
            .equity_risk_premium
            .ok_or("--equity-risk-premium is required (or provide --input)")?],
        initial_cost_of_debt: args.cost_of_debt.unwrap_or(Decimal::ZERO),
        target_cost_of_debt: None,
        capital_weights: vec![CapitalWeights {
            debt: args.debt_weight,
            equity: Decimal::ONE - args.debt_weight,
        }],
        terminal_growth_rate: args.terminal_growth,
        reinvestment: match args.reinvestment_rate {
            Some(rate) => ReinvestmentBasis::RateOnIncrementalRevenue(rate),
            None => ReinvestmentBasis::default(),
        },
        net_debt: args.net_debt,
        shares_outstanding: args.shares_outstanding,
        market_price: args.market_price,
        acquisition_likelihood: None,
        currency: Currency::USD,
    })
}

pub fn run_dcf(args: DcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions: AssumptionSet = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        assumptions_from_flags(&args)?
    };

    let result = discount::run_dcf(&assumptions)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_implied_growth(args: ImpliedGrowthArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut assumptions: AssumptionSet = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input file (or piped JSON) is required for implied-growth".into());
    };

    if let Some(price) = args.market_price {
        assumptions.market_price = Some(price);
    }

    let result = implied::find_implied_growth(&assumptions)?;
    Ok(serde_json::to_value(result)?)
}
