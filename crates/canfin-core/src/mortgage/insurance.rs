//! Mortgage default-insurance premiums.
//!
//! High-ratio mortgages (down payment below 20%) require default insurance;
//! the premium is a percentage of the financed amount, banded by the
//! down-payment ratio. The premium itself is normally capitalized into the
//! mortgage, which is how the affordability estimator consumes it.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CanfinError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::CanfinResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum down-payment ratio for an insurable mortgage.
pub const MIN_INSURABLE_DOWN_RATIO: Decimal = dec!(0.05);

/// Down-payment ratio at which insurance is no longer required.
pub const NO_INSURANCE_DOWN_RATIO: Decimal = dec!(0.20);

/// A premium band: applies when `min_ratio <= ratio < max_ratio`.
#[derive(Debug, Clone, Copy)]
pub struct PremiumBand {
    pub min_ratio: Decimal,
    pub max_ratio: Decimal,
    pub premium_rate: Rate,
}

/// Premium bands in ascending down-payment-ratio order.
const PREMIUM_BANDS: [PremiumBand; 3] = [
    PremiumBand {
        min_ratio: dec!(0.05),
        max_ratio: dec!(0.10),
        premium_rate: dec!(0.04),
    },
    PremiumBand {
        min_ratio: dec!(0.10),
        max_ratio: dec!(0.15),
        premium_rate: dec!(0.031),
    },
    PremiumBand {
        min_ratio: dec!(0.15),
        max_ratio: dec!(0.20),
        premium_rate: dec!(0.028),
    },
];

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Insurance premium input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePremiumInput {
    /// Purchase price of the property.
    pub purchase_price: Money,
    /// Down payment applied against the price.
    pub down_payment: Money,
}

/// Insurance premium output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePremiumOutput {
    /// Down payment as a fraction of the purchase price.
    pub down_payment_ratio: Rate,
    /// Premium rate applied (zero at or above the 20% ratio).
    pub premium_rate: Rate,
    /// Premium in whole dollars.
    pub premium: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Premium rate for a down-payment ratio.
///
/// Returns zero at or above the 20% ratio; below 5% the mortgage is not
/// insurable and the call fails.
pub fn premium_rate_for_ratio(ratio: Rate) -> CanfinResult<Rate> {
    if ratio < MIN_INSURABLE_DOWN_RATIO {
        return Err(CanfinError::InvalidInput {
            field: "down_payment".into(),
            reason: "Down payment must be at least 5% of the purchase price".into(),
        });
    }
    if ratio >= NO_INSURANCE_DOWN_RATIO {
        return Ok(Decimal::ZERO);
    }

    for band in &PREMIUM_BANDS {
        if ratio >= band.min_ratio && ratio < band.max_ratio {
            return Ok(band.premium_rate);
        }
    }

    // Bands are contiguous over [0.05, 0.20); unreachable for valid ratios.
    Ok(Decimal::ZERO)
}

/// Premium in whole dollars for a purchase price and down payment.
///
/// The rate applies to the financed amount (price minus down payment) and the
/// result is rounded to the nearest dollar, half away from zero.
pub fn premium_amount(purchase_price: Money, down_payment: Money) -> CanfinResult<Money> {
    validate_premium_inputs(purchase_price, down_payment)?;

    let ratio = down_payment / purchase_price;
    let rate = premium_rate_for_ratio(ratio)?;
    let financed = purchase_price - down_payment;

    Ok((rate * financed).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
}

/// Calculate the default-insurance premium with the full output envelope.
pub fn mortgage_insurance_premium(
    input: &InsurancePremiumInput,
) -> CanfinResult<ComputationOutput<InsurancePremiumOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    validate_premium_inputs(input.purchase_price, input.down_payment)?;

    let down_payment_ratio = input.down_payment / input.purchase_price;
    let premium_rate = premium_rate_for_ratio(down_payment_ratio)?;
    let premium = premium_amount(input.purchase_price, input.down_payment)?;

    let output = InsurancePremiumOutput {
        down_payment_ratio,
        premium_rate,
        premium,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Down-Payment Ratio Premium Bands",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_premium_inputs(purchase_price: Money, down_payment: Money) -> CanfinResult<()> {
    if purchase_price <= Decimal::ZERO {
        return Err(CanfinError::InvalidInput {
            field: "purchase_price".into(),
            reason: "Purchase price must be positive".into(),
        });
    }
    if down_payment < Decimal::ZERO {
        return Err(CanfinError::InvalidInput {
            field: "down_payment".into(),
            reason: "Down payment cannot be negative".into(),
        });
    }
    if down_payment > purchase_price {
        return Err(CanfinError::InvalidInput {
            field: "down_payment".into(),
            reason: "Down payment cannot exceed the purchase price".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
