//! Inflation adjustment between two consumer price index readings.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CanfinError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::CanfinResult;

/// Default decimal places for the adjusted amount.
const DEFAULT_DECIMALS: u32 = 2;

/// Inflation adjustment input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflationInput {
    /// Amount expressed in source-period dollars.
    pub amount: Money,
    /// CPI reading for the period the amount is expressed in.
    pub source_cpi: Decimal,
    /// CPI reading for the period to restate the amount in.
    pub target_cpi: Decimal,
    /// Decimal places for the result (default 2).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
}

/// Inflation adjustment output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflationOutput {
    /// Amount restated in target-period dollars.
    pub adjusted_amount: Money,
    /// Ratio applied: target CPI over source CPI.
    pub inflation_factor: Decimal,
}

/// Restate `amount` from source-period to target-period dollars.
pub fn adjusted_amount(
    amount: Money,
    source_cpi: Decimal,
    target_cpi: Decimal,
    decimals: Option<u32>,
) -> CanfinResult<Money> {
    validate_cpi("source_cpi", source_cpi)?;
    validate_cpi("target_cpi", target_cpi)?;

    let adjusted = amount * target_cpi / source_cpi;
    Ok(adjusted.round_dp_with_strategy(
        decimals.unwrap_or(DEFAULT_DECIMALS),
        RoundingStrategy::MidpointAwayFromZero,
    ))
}

/// Inflation adjustment with the full output envelope.
pub fn adjust_for_inflation(
    input: &InflationInput,
) -> CanfinResult<ComputationOutput<InflationOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let adjusted = adjusted_amount(
        input.amount,
        input.source_cpi,
        input.target_cpi,
        input.decimals,
    )?;
    let output = InflationOutput {
        adjusted_amount: adjusted,
        inflation_factor: input.target_cpi / input.source_cpi,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "CPI Ratio Adjustment",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_cpi(field: &str, value: Decimal) -> CanfinResult<()> {
    if value <= Decimal::ZERO {
        return Err(CanfinError::InvalidInput {
            field: field.into(),
            reason: "CPI must be positive".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_adjustment_upward() {
        // 100 at CPI 100 restated at CPI 110 is 110.00.
        let result = adjusted_amount(dec!(100), dec!(100), dec!(110), None).unwrap();
        assert_eq!(result, dec!(110.00));
    }

    #[test]
    fn test_adjustment_downward() {
        let result = adjusted_amount(dec!(250), dec!(137.4), dec!(120.1), None).unwrap();
        // 250 * 120.1 / 137.4 = 218.5225...
        assert_eq!(result, dec!(218.52));
    }

    #[test]
    fn test_decimals_override() {
        let result = adjusted_amount(dec!(250), dec!(137.4), dec!(120.1), Some(4)).unwrap();
        assert_eq!(result, dec!(218.5226));
    }

    #[test]
    fn test_zero_cpi_rejected() {
        assert!(adjusted_amount(dec!(100), Decimal::ZERO, dec!(110), None).is_err());
        assert!(adjusted_amount(dec!(100), dec!(110), Decimal::ZERO, None).is_err());
    }

    #[test]
    fn test_envelope_reports_factor() {
        let input = InflationInput {
            amount: dec!(1000),
            source_cpi: dec!(100),
            target_cpi: dec!(125),
            decimals: None,
        };
        let out = adjust_for_inflation(&input).unwrap();
        assert_eq!(out.result.adjusted_amount, dec!(1250.00));
        assert_eq!(out.result.inflation_factor, dec!(1.25));
    }
}
