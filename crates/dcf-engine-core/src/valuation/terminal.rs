use rust_decimal::Decimal;

use crate::error::ValuationError;
use crate::types::{Money, Rate};
use crate::EngineResult;

/// Terminal value at the forecast horizon via the perpetuity-growth
/// formula: TV = FCF(final) * (1 + g) / (r(final) - g).
///
/// Uses the final year's discount rate, never an average. Fails with
/// `InvalidRate` when the denominator is non-positive, which would make
/// the perpetuity undefined or infinite.
pub fn terminal_value(
    final_fcf: Money,
    terminal_growth: Rate,
    final_discount_rate: Rate,
) -> EngineResult<Money> {
    let denom = final_discount_rate - terminal_growth;
    if denom <= Decimal::ZERO {
        return Err(ValuationError::InvalidRate(format!(
            "Terminal growth rate ({terminal_growth}) must be strictly below the final-year \
             discount rate ({final_discount_rate})"
        )));
    }
    Ok(final_fcf * (Decimal::ONE + terminal_growth) / denom)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_perpetuity_growth_arithmetic() {
        // TV = 100 * 1.02 / (0.10 - 0.02) = 102 / 0.08 = 1275
        let tv = terminal_value(dec!(100), dec!(0.02), dec!(0.10)).unwrap();
        assert_eq!(tv, dec!(1275));
    }

    #[test]
    fn test_positive_finite_for_valid_inputs() {
        let tv = terminal_value(dec!(24.157650), dec!(0.02), dec!(0.10)).unwrap();
        assert!(tv > Decimal::ZERO);
    }

    #[test]
    fn test_growth_equal_to_rate_rejected() {
        let result = terminal_value(dec!(100), dec!(0.10), dec!(0.10));
        assert!(matches!(result.unwrap_err(), ValuationError::InvalidRate(_)));
    }

    #[test]
    fn test_growth_above_rate_rejected() {
        let result = terminal_value(dec!(100), dec!(0.12), dec!(0.10));
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_final_fcf_gives_negative_terminal_value() {
        // Perpetuity of losses is a valid (negative) value
        let tv = terminal_value(dec!(-50), dec!(0.02), dec!(0.10)).unwrap();
        assert!(tv < Decimal::ZERO);
    }
}
