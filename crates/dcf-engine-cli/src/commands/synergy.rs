use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use dcf_engine_core::synergy::{self, BlendedWaccInput, BuyerDiscount, SynergyInput};
use dcf_engine_core::valuation::assumptions::AssumptionSet;

use crate::input;

/// Combined input document for a synergy-adjusted valuation: the target's
/// standalone assumptions plus the synergy case.
#[derive(Deserialize)]
pub struct AcquisitionCase {
    pub assumptions: AssumptionSet,
    pub synergies: SynergyInput,
}

/// Arguments for a synergy-adjusted valuation
#[derive(Args)]
pub struct SynergyArgs {
    /// Path to a JSON or YAML file with `assumptions` and `synergies`
    #[arg(long)]
    pub input: Option<String>,

    /// Flat buyer WACC for the synergy schedule (overrides the file's
    /// buyer discount basis)
    #[arg(long)]
    pub buyer_wacc: Option<Decimal>,
}

/// Arguments for a value-weighted post-merger WACC
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct BlendedWaccArgs {
    /// Path to a JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Acquirer levered beta
    #[arg(long)]
    pub acquirer_beta: Option<Decimal>,

    /// Acquirer standalone equity value
    #[arg(long)]
    pub acquirer_equity: Option<Decimal>,

    /// Target levered beta
    #[arg(long)]
    pub target_beta: Option<Decimal>,

    /// Target standalone equity value
    #[arg(long)]
    pub target_equity: Option<Decimal>,

    /// Risk-free rate
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Equity risk premium
    #[arg(long, alias = "erp")]
    pub equity_risk_premium: Option<Decimal>,

    /// Pre-tax cost of debt of the combined entity
    #[arg(long)]
    pub cost_of_debt: Option<Decimal>,

    /// Marginal tax rate of the combined entity
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Post-merger debt weight
    #[arg(long)]
    pub debt_weight: Option<Decimal>,
}

pub fn run_synergy(args: SynergyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut case: AcquisitionCase = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err(
            "--input file (or piped JSON) with `assumptions` and `synergies` is required".into(),
        );
    };

    if let Some(rate) = args.buyer_wacc {
        case.synergies.buyer_discount = BuyerDiscount::FlatRate(rate);
    }

    let result = synergy::value_with_synergies(&case.assumptions, &case.synergies)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_blended_wacc(args: BlendedWaccArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let blend_input: BlendedWaccInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        BlendedWaccInput {
            acquirer_beta: args
                .acquirer_beta
                .ok_or("--acquirer-beta is required (or provide --input)")?,
            acquirer_equity_value: args
                .acquirer_equity
                .ok_or("--acquirer-equity is required (or provide --input)")?,
            target_beta: args
                .target_beta
                .ok_or("--target-beta is required (or provide --input)")?,
            target_equity_value: args
                .target_equity
                .ok_or("--target-equity is required (or provide --input)")?,
            risk_free_rate: args
                .risk_free_rate
                .ok_or("--risk-free-rate is required (or provide --input)")?,
            equity_risk_premium: args
                .equity_risk_premium
                .ok_or("--equity-risk-premium is required (or provide --input)")?,
            cost_of_debt: args
                .cost_of_debt
                .ok_or("--cost-of-debt is required (or provide --input)")?,
            tax_rate: args
                .tax_rate
                .ok_or("--tax-rate is required (or provide --input)")?,
            debt_weight: args
                .debt_weight
                .ok_or("--debt-weight is required (or provide --input)")?,
        }
    };

    let wacc = synergy::blended_wacc(&blend_input)?;
    Ok(serde_json::json!({
        "result": { "blended_wacc": wacc.to_string() },
    }))
}
