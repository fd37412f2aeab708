use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::schedule::value_for_year;
use crate::types::{Money, Rate};
use crate::EngineResult;

use super::assumptions::{AssumptionSet, ReinvestmentBasis};

/// One forecast year of the unlevered free cash flow build-up, before any
/// discounting is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowYear {
    pub year: u32,
    pub growth: Rate,
    pub margin: Rate,
    pub tax_rate: Rate,
    pub revenue: Money,
    pub ebit: Money,
    pub nopat: Money,
    pub reinvestment: Money,
    pub fcf: Money,
}

/// Build the per-year unlevered FCF schedule from the projected growth,
/// margin, and tax paths.
///
/// revenue(y) = revenue(y-1) * (1 + growth(y)), with year 0 at the base
/// revenue; EBIT(y) = revenue(y) * margin(y); FCF(y) = EBIT(y) * (1 - tax(y))
/// minus reinvestment from the configured basis. Pure function; discount
/// factors are applied downstream.
pub fn forecast_cash_flows(
    assumptions: &AssumptionSet,
    growth: &[Rate],
    margins: &[Rate],
    tax_rates: &[Rate],
) -> EngineResult<Vec<CashFlowYear>> {
    let n = assumptions.horizon as usize;
    for (name, path) in [("growth", growth), ("margin", margins), ("tax", tax_rates)] {
        if path.len() != n {
            return Err(ValuationError::InsufficientData(format!(
                "{name} path has {} years but the horizon is {n}",
                path.len()
            )));
        }
    }
    if let ReinvestmentBasis::Schedule(ref amounts) = assumptions.reinvestment {
        if amounts.is_empty() {
            return Err(ValuationError::Configuration {
                field: "reinvestment".into(),
                reason: "Reinvestment schedule must contain at least one year".into(),
            });
        }
    }

    let mut years = Vec::with_capacity(n);
    let mut prev_revenue = assumptions.base_revenue;

    for year_idx in 0..n {
        let revenue = prev_revenue * (Decimal::ONE + growth[year_idx]);
        let ebit = revenue * margins[year_idx];
        let nopat = ebit * (Decimal::ONE - tax_rates[year_idx]);

        let reinvestment = match assumptions.reinvestment {
            ReinvestmentBasis::RateOnIncrementalRevenue(rate) => (revenue - prev_revenue) * rate,
            ReinvestmentBasis::Schedule(ref amounts) => {
                value_for_year(amounts, year_idx).unwrap_or(Decimal::ZERO)
            }
        };

        years.push(CashFlowYear {
            year: year_idx as u32 + 1,
            growth: growth[year_idx],
            margin: margins[year_idx],
            tax_rate: tax_rates[year_idx],
            revenue,
            ebit,
            nopat,
            reinvestment,
            fcf: nopat - reinvestment,
        });

        prev_revenue = revenue;
    }

    Ok(years)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
