use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::types::Rate;

/// A quoted nominal annual rate together with its compounding convention.
///
/// Canadian fixed-rate mortgages are quoted with semi-annual compounding
/// (`compounding_periods_per_year = 2`) regardless of how often payments are
/// actually made, so converting a quoted rate to a per-payment rate always
/// goes through the effective annual rate, never through `nominal / payments`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSpec {
    /// Nominal annual rate as a decimal fraction (0.06 = 6%).
    pub nominal_annual_rate: Rate,
    /// Compounding periods per year behind the quote. Must be at least 1;
    /// public entry points validate this before constructing a spec.
    pub compounding_periods_per_year: u32,
}

impl RateSpec {
    /// Semi-annual compounding, the statutory default for Canadian mortgages.
    pub fn semi_annual(nominal_annual_rate: Rate) -> Self {
        RateSpec {
            nominal_annual_rate,
            compounding_periods_per_year: 2,
        }
    }
}

/// Effective annual rate implied by a nominal quote: `(1 + r/m)^m - 1`.
pub fn effective_annual_rate(spec: &RateSpec) -> Rate {
    if spec.nominal_annual_rate.is_zero() {
        return Decimal::ZERO;
    }

    let m = Decimal::from(spec.compounding_periods_per_year);
    let base = Decimal::ONE + spec.nominal_annual_rate / m;
    base.powd(m) - Decimal::ONE
}

/// Per-payment rate for a schedule with `payments_per_year` payments:
/// `(1 + EAR)^(1/p) - 1`.
///
/// Compounding the result `payments_per_year` times recovers the effective
/// annual rate exactly, which is what makes schedules at different payment
/// frequencies financially equivalent.
pub fn periodic_rate(spec: &RateSpec, payments_per_year: u32) -> Rate {
    let effective = effective_annual_rate(spec);
    if effective.is_zero() {
        return Decimal::ZERO;
    }

    let p = Decimal::from(payments_per_year);
    let exponent = Decimal::ONE / p;
    (Decimal::ONE + effective).powd(exponent) - Decimal::ONE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    #[test]
    fn test_effective_rate_semi_annual() {
        // 6% compounded semi-annually: (1.03)^2 - 1 = 6.09% exactly.
        let spec = RateSpec::semi_annual(dec!(0.06));
        assert_close(
            effective_annual_rate(&spec),
            dec!(0.0609),
            dec!(0.0000001),
            "Semi-annual EAR",
        );
    }

    #[test]
    fn test_monthly_periodic_rate_from_semi_annual_quote() {
        // (1.0609)^(1/12) - 1 ≈ 0.00493862, the standard Canadian monthly rate
        // for a 6% quote.
        let spec = RateSpec::semi_annual(dec!(0.06));
        assert_close(
            periodic_rate(&spec, 12),
            dec!(0.004938622),
            dec!(0.0000001),
            "Monthly periodic rate",
        );
    }

    #[test]
    fn test_periodic_rate_matches_compounding_frequency() {
        // When the payment frequency equals the compounding frequency the
        // periodic rate collapses to nominal / m.
        let spec = RateSpec {
            nominal_annual_rate: dec!(0.06),
            compounding_periods_per_year: 12,
        };
        assert_close(
            periodic_rate(&spec, 12),
            dec!(0.005),
            dec!(0.0000001),
            "Monthly-compounded monthly rate",
        );
    }

    #[test]
    fn test_zero_rate() {
        let spec = RateSpec::semi_annual(Decimal::ZERO);
        assert_eq!(effective_annual_rate(&spec), Decimal::ZERO);
        assert_eq!(periodic_rate(&spec, 26), Decimal::ZERO);
    }

    #[test]
    fn test_faster_payments_have_smaller_periodic_rate() {
        let spec = RateSpec::semi_annual(dec!(0.06));
        let weekly = periodic_rate(&spec, 52);
        let monthly = periodic_rate(&spec, 12);
        assert!(
            weekly < monthly,
            "Weekly rate ({weekly}) should be below monthly rate ({monthly})"
        );
    }
}
