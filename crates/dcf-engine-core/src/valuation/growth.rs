use crate::error::ValuationError;
use crate::schedule::transition_path;
use crate::types::Rate;
use crate::EngineResult;

use super::assumptions::AssumptionSet;

/// Project the per-year revenue growth schedule across three phases:
/// a hold phase at the beginning rate, a transition phase interpolating
/// toward the target rate, and a maturity phase pinned at the target.
///
/// When the configured phases exceed the horizon, the transition phase is
/// compressed to fit. A hold phase longer than the horizon itself cannot
/// be compressed and is a configuration error. A one-year horizon returns
/// the beginning rate only.
pub fn project_growth(assumptions: &AssumptionSet) -> EngineResult<Vec<Rate>> {
    let n = assumptions.horizon;
    if n == 0 {
        return Err(ValuationError::Configuration {
            field: "horizon".into(),
            reason: "Forecast horizon must be at least 1 year".into(),
        });
    }
    if n == 1 {
        return Ok(vec![assumptions.initial_growth]);
    }

    let phases = &assumptions.growth_phases;
    let hold = phases.hold_years.unwrap_or(n / 2);
    if hold > n {
        return Err(ValuationError::Configuration {
            field: "growth_phases.hold_years".into(),
            reason: format!(
                "Hold phase of {hold} years exceeds the {n}-year horizon; \
                 the transition phase cannot have negative length"
            ),
        });
    }

    let remaining = n - hold;
    let transition = match phases.transition_years {
        // Compress the transition into whatever the hold phase left over.
        Some(t) => t.min(remaining),
        None => remaining,
    };
    let maturity = remaining - transition;

    let mut rates = Vec::with_capacity(n as usize);
    rates.extend(std::iter::repeat(assumptions.initial_growth).take(hold as usize));
    rates.extend(transition_path(
        assumptions.initial_growth,
        assumptions.target_growth,
        transition,
        &phases.shape,
    )?);
    rates.extend(std::iter::repeat(assumptions.target_growth).take(maturity as usize));

    debug_assert_eq!(rates.len(), n as usize);
    Ok(rates)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
