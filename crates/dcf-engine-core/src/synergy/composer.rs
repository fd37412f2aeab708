use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ValuationError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::valuation::assumptions::AssumptionSet;
use crate::valuation::discount::{run_dcf_pipeline, DcfOutput};
use crate::EngineResult;

use super::discount::{discount_schedule, resolve_buyer_rates, BuyerDiscount, SynergyScheduleEntry};
use super::schedule::{build_schedule, SynergyDriver};

const MOS_LADDER: [Decimal; 3] = [dec!(0.10), dec!(0.20), dec!(0.30)];

/// Optional derived outputs the caller explicitly asks for. Requesting one
/// turns a silently absent field into a `MissingInput` error when the
/// assumptions cannot support it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CompositionTargets {
    #[serde(default)]
    pub value_per_share: bool,
    #[serde(default)]
    pub margin_of_safety: bool,
}

/// Synergy side of a combined valuation: the drivers, the buyer's
/// discounting basis, and which derived outputs are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyInput {
    pub drivers: Vec<SynergyDriver>,
    #[serde(default)]
    pub buyer_discount: BuyerDiscount,
    #[serde(default)]
    pub targets: CompositionTargets,
}

/// Entry price that locks in a given margin of safety against the
/// synergy-adjusted per-share value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginOfSafetyTarget {
    pub margin: Rate,
    pub target_price: Money,
}

/// Standalone DCF plus the discounted synergy schedule and the combined
/// valuation bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyAdjustedOutput {
    pub standalone: DcfOutput,
    pub synergy_schedule: Vec<SynergyScheduleEntry>,
    /// Present value of all synergy cash flows at the buyer's rates.
    pub synergy_pv: Money,
    pub combined_enterprise_value: Money,
    pub combined_equity_value: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_value_per_share: Option<Money>,
    /// (implied - market) / implied against the standalone per-share value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standalone_margin_of_safety: Option<Rate>,
    /// Same ratio against the synergy-adjusted per-share value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_margin_of_safety: Option<Rate>,
    /// Entry prices at 10/20/30% margins of safety off the combined value.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub margin_of_safety_targets: Vec<MarginOfSafetyTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition_likelihood: Option<Decimal>,
}

/// Run the standalone DCF, layer the ramp-weighted synergy schedule on
/// top at the buyer's discount rates, and bridge to a combined equity
/// value. With no drivers (or all amounts zero) the combined figures
/// equal the standalone run exactly.
pub fn value_with_synergies(
    assumptions: &AssumptionSet,
    synergies: &SynergyInput,
) -> EngineResult<ComputationOutput<SynergyAdjustedOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    assumptions.validate(&mut warnings)?;
    require_targets(assumptions, &synergies.targets)?;

    let standalone = run_dcf_pipeline(assumptions, &mut warnings)?;

    let schedule = build_schedule(&synergies.drivers, assumptions.horizon, &mut warnings)?;
    let target_rates: Vec<Rate> = standalone
        .projections
        .iter()
        .map(|p| p.discount_rate)
        .collect();
    let buyer_rates = resolve_buyer_rates(&synergies.buyer_discount, &target_rates)?;
    let (synergy_schedule, synergy_pv) = discount_schedule(&schedule, &buyer_rates)?;

    let combined_enterprise_value = standalone.enterprise_value + synergy_pv;
    let combined_equity_value =
        combined_enterprise_value - assumptions.net_debt.unwrap_or(Decimal::ZERO);

    let combined_value_per_share = match assumptions.shares_outstanding {
        Some(shares) if shares > Decimal::ZERO => Some(combined_equity_value / shares),
        _ => None,
    };

    let standalone_margin_of_safety =
        margin_of_safety(standalone.value_per_share, assumptions.market_price);
    let combined_margin_of_safety =
        margin_of_safety(combined_value_per_share, assumptions.market_price);

    let margin_of_safety_targets = match combined_value_per_share {
        Some(per_share) if assumptions.market_price.is_some() => MOS_LADDER
            .iter()
            .map(|margin| MarginOfSafetyTarget {
                margin: *margin,
                target_price: per_share * (Decimal::ONE - margin),
            })
            .collect(),
        _ => Vec::new(),
    };

    let output = SynergyAdjustedOutput {
        acquisition_likelihood: standalone.acquisition_likelihood,
        standalone,
        synergy_schedule,
        synergy_pv,
        combined_enterprise_value,
        combined_equity_value,
        combined_value_per_share,
        standalone_margin_of_safety,
        combined_margin_of_safety,
        margin_of_safety_targets,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let echoed = serde_json::json!({
        "assumptions": assumptions,
        "synergies": synergies,
    });
    Ok(with_metadata(
        "Synergy-adjusted DCF (buyer-discounted synergy schedule)",
        &echoed,
        warnings,
        elapsed,
        output,
    ))
}

/// Discount of the market price to the implied value, as a fraction of
/// the implied value. Positive means the market trades below intrinsic.
fn margin_of_safety(implied: Option<Money>, market: Option<Money>) -> Option<Rate> {
    match (implied, market) {
        (Some(implied), Some(market)) if !implied.is_zero() => {
            Some((implied - market) / implied)
        }
        _ => None,
    }
}

fn require_targets(
    assumptions: &AssumptionSet,
    targets: &CompositionTargets,
) -> EngineResult<()> {
    if (targets.value_per_share || targets.margin_of_safety)
        && assumptions.shares_outstanding.is_none()
    {
        return Err(ValuationError::MissingInput {
            field: "shares_outstanding".into(),
            reason: "Per-share outputs were requested but shares outstanding is not set".into(),
        });
    }
    if targets.margin_of_safety && assumptions.market_price.is_none() {
        return Err(ValuationError::MissingInput {
            field: "market_price".into(),
            reason: "Margin of safety was requested but market price is not set".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
