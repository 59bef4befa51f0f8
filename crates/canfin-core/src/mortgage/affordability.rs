//! Maximum-affordability estimation under the mortgage stress test.
//!
//! The serviceable purchase price is the largest candidate whose carrying
//! costs fit the GDS/TDS limits at the qualifying rate. Carrying costs of a
//! candidate depend on the candidate itself (the default property-tax
//! estimate is a percentage of the price, and the insurance premium is
//! capitalized into the mortgage), so each probe re-derives premium, payment
//! and tax from scratch. The search runs on a $1000 price grid, which is also
//! the increment the result is reported in.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::error::CanfinError;
use crate::mortgage::insurance::{premium_amount, MIN_INSURABLE_DOWN_RATIO};
use crate::mortgage::rates::{periodic_rate, RateSpec};
use crate::mortgage::schedule::level_payment;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::CanfinResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Spread added to the contract rate for qualification.
const QUALIFYING_SPREAD: Percent = dec!(2.0);

/// Minimum qualifying rate regardless of contract rate.
const QUALIFYING_FLOOR: Percent = dec!(5.25);

/// Gross debt service limit: housing costs over gross monthly income.
const GDS_LIMIT: Decimal = dec!(0.39);

/// Total debt service limit: housing plus other debt over income.
const TDS_LIMIT: Decimal = dec!(0.44);

/// Default monthly heating cost when the caller supplies none.
const DEFAULT_MONTHLY_HEATING: Money = dec!(175);

/// Annual property-tax estimate as a fraction of the purchase price.
const PROPERTY_TAX_RATE: Rate = dec!(0.015);

/// Amortization period used to size the qualifying payment.
const QUALIFYING_AMORTIZATION_YEARS: u32 = 25;

/// Price grid increment; results are reported in this increment.
const PRICE_INCREMENT: Decimal = dec!(1000);

/// Hard ceiling on the result.
const MAX_PURCHASE_PRICE: Money = dec!(10000000);

/// Safety cap on bisection probes.
const MAX_SEARCH_ITERATIONS: u32 = 64;

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Monthly obligations considered in the debt service ratios. Any field left
/// unset falls back to its documented default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffordabilityOptions {
    /// Non-housing debt payments (loans, cards). Default 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_debt_payment: Option<Money>,
    /// Heating costs. Default 175.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_heating: Option<Money>,
    /// Property tax. Default: 1.5% of the candidate price per year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_tax: Option<Money>,
    /// Condo fees. Default 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_condo_fees: Option<Money>,
}

/// Affordability estimation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityInput {
    /// Gross annual household income.
    pub annual_income: Money,
    /// Cash available as a down payment.
    pub down_payment: Money,
    /// Contract annual rate in percentage points (5.25 = 5.25%).
    pub annual_rate: Percent,
    #[serde(default)]
    pub options: AffordabilityOptions,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Which constraint capped the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AffordabilityLimit {
    /// GDS or TDS limit binds before any structural bound.
    #[serde(rename = "debt limit")]
    DebtLimit,
    /// The 5% minimum down-payment ratio binds.
    #[serde(rename = "downPayment limit")]
    DownPaymentLimit,
    /// The configured price ceiling binds.
    #[serde(rename = "max purchase price")]
    MaxPurchasePrice,
}

impl fmt::Display for AffordabilityLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AffordabilityLimit::DebtLimit => "debt limit",
            AffordabilityLimit::DownPaymentLimit => "downPayment limit",
            AffordabilityLimit::MaxPurchasePrice => "max purchase price",
        };
        f.write_str(label)
    }
}

/// Affordability estimation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityOutput {
    /// Echo of the income input.
    pub annual_income: Money,
    /// Echo of the down payment input.
    pub down_payment: Money,
    /// Echo of the contract rate.
    pub annual_rate: Percent,
    /// Qualifying rate actually used: max(contract + 2, 5.25).
    pub rate_tested: Percent,
    /// Maximum purchase price, a multiple of the $1000 increment.
    pub purchase_price: Money,
    /// Financed amount (price - down + premium), rounded to the increment.
    pub mortgage_amount: Money,
    /// Insurance premium capitalized into the mortgage, whole dollars.
    pub insurance_premium: Money,
    /// Monthly payment at the qualifying rate over 25 years.
    pub monthly_payment: Money,
    /// Gross debt service ratio at the result.
    pub gds_ratio: Decimal,
    /// Total debt service ratio at the result.
    pub tds_ratio: Decimal,
    /// Constraint that capped the result.
    pub reason: AffordabilityLimit,
    /// Heating cost used in the ratios.
    pub monthly_heating: Money,
    /// True when the heating cost is the built-in default.
    pub is_heating_estimate: bool,
    /// Property tax used in the ratios (estimated or supplied).
    pub monthly_tax: Money,
    /// True when the tax was estimated from the price.
    pub is_tax_estimate: bool,
    /// Condo fees used in the ratios.
    pub monthly_condo_fees: Money,
    /// Non-housing debt payments used in the ratios.
    pub monthly_debt_payment: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Estimate the maximum affordable purchase price and mortgage.
pub fn mortgage_max_amount(
    input: &AffordabilityInput,
) -> CanfinResult<ComputationOutput<AffordabilityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_affordability(input)?;

    let rate_tested = (input.annual_rate + QUALIFYING_SPREAD).max(QUALIFYING_FLOOR);
    let context = SearchContext::new(input, rate_tested);

    let upper_ratio_bound = input.down_payment / MIN_INSURABLE_DOWN_RATIO;
    let structural_limit = if upper_ratio_bound <= MAX_PURCHASE_PRICE {
        AffordabilityLimit::DownPaymentLimit
    } else {
        AffordabilityLimit::MaxPurchasePrice
    };
    let grid_upper = floor_to_increment(upper_ratio_bound.min(MAX_PURCHASE_PRICE));
    let grid_lower = ceil_to_increment(input.down_payment);

    let (price, reason) = if grid_upper < grid_lower {
        (Decimal::ZERO, structural_limit)
    } else if !context.within_limits(grid_lower)? {
        // Even the smallest financeable purchase breaches the limits.
        (Decimal::ZERO, AffordabilityLimit::DebtLimit)
    } else if context.within_limits(grid_upper)? {
        (grid_upper, structural_limit)
    } else {
        let price = bisect_price_grid(&context, grid_lower, grid_upper)?;
        (price, AffordabilityLimit::DebtLimit)
    };

    if price.is_zero() {
        warnings.push(
            "No financeable purchase price satisfies the debt service limits".to_string(),
        );
        log::debug!(
            target: "canfin::affordability",
            "empty feasible set: lower {grid_lower}, upper {grid_upper}"
        );
    }

    let output = context.build_output(input, rate_tested, price, reason)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Stress-Tested GDS/TDS Affordability Search",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Search internals
// ---------------------------------------------------------------------------

/// Immutable per-call state shared by every candidate probe.
struct SearchContext {
    down_payment: Money,
    monthly_income: Money,
    monthly_rate: Rate,
    monthly_heating: Money,
    is_heating_estimate: bool,
    fixed_tax: Option<Money>,
    monthly_condo_fees: Money,
    monthly_debt_payment: Money,
}

/// Carrying costs and ratios of one candidate price.
struct CandidateAssessment {
    gds: Decimal,
    tds: Decimal,
    monthly_payment: Money,
    insurance_premium: Money,
    monthly_tax: Money,
    mortgage_amount: Money,
}

impl SearchContext {
    fn new(input: &AffordabilityInput, rate_tested: Percent) -> Self {
        let spec = RateSpec::semi_annual(rate_tested / dec!(100));
        SearchContext {
            down_payment: input.down_payment,
            monthly_income: input.annual_income / MONTHS_PER_YEAR,
            monthly_rate: periodic_rate(&spec, 12),
            monthly_heating: input
                .options
                .monthly_heating
                .unwrap_or(DEFAULT_MONTHLY_HEATING),
            is_heating_estimate: input.options.monthly_heating.is_none(),
            fixed_tax: input.options.monthly_tax,
            monthly_condo_fees: input.options.monthly_condo_fees.unwrap_or(Decimal::ZERO),
            monthly_debt_payment: input.options.monthly_debt_payment.unwrap_or(Decimal::ZERO),
        }
    }

    fn monthly_tax_for(&self, price: Money) -> Money {
        match self.fixed_tax {
            Some(tax) => tax,
            None => price * PROPERTY_TAX_RATE / MONTHS_PER_YEAR,
        }
    }

    /// Premium, payment and debt service ratios for a candidate price.
    fn assess(&self, price: Money) -> CanfinResult<CandidateAssessment> {
        let insurance_premium = premium_amount(price, self.down_payment)?;
        let mortgage_amount = price - self.down_payment + insurance_premium;
        let monthly_payment = if mortgage_amount > Decimal::ZERO {
            level_payment(
                mortgage_amount,
                self.monthly_rate,
                12 * QUALIFYING_AMORTIZATION_YEARS,
            )
        } else {
            Decimal::ZERO
        };
        let monthly_tax = self.monthly_tax_for(price);

        let housing = monthly_payment + self.monthly_heating + monthly_tax + self.monthly_condo_fees;
        let gds = housing / self.monthly_income;
        let tds = gds + self.monthly_debt_payment / self.monthly_income;

        Ok(CandidateAssessment {
            gds,
            tds,
            monthly_payment,
            insurance_premium,
            monthly_tax,
            mortgage_amount,
        })
    }

    fn within_limits(&self, price: Money) -> CanfinResult<bool> {
        let assessment = self.assess(price)?;
        Ok(assessment.gds <= GDS_LIMIT && assessment.tds <= TDS_LIMIT)
    }

    /// Assessment of the empty result: no purchase, fixed obligations only.
    fn assess_nothing(&self) -> CandidateAssessment {
        let monthly_tax = self.fixed_tax.unwrap_or(Decimal::ZERO);
        let housing = self.monthly_heating + monthly_tax + self.monthly_condo_fees;
        let gds = housing / self.monthly_income;
        CandidateAssessment {
            gds,
            tds: gds + self.monthly_debt_payment / self.monthly_income,
            monthly_payment: Decimal::ZERO,
            insurance_premium: Decimal::ZERO,
            monthly_tax,
            mortgage_amount: Decimal::ZERO,
        }
    }

    fn build_output(
        &self,
        input: &AffordabilityInput,
        rate_tested: Percent,
        price: Money,
        reason: AffordabilityLimit,
    ) -> CanfinResult<AffordabilityOutput> {
        let assessment = if price.is_zero() {
            self.assess_nothing()
        } else {
            self.assess(price)?
        };

        Ok(AffordabilityOutput {
            annual_income: input.annual_income,
            down_payment: input.down_payment,
            annual_rate: input.annual_rate,
            rate_tested,
            purchase_price: price,
            mortgage_amount: round_to_increment(assessment.mortgage_amount),
            insurance_premium: assessment.insurance_premium,
            monthly_payment: round_cents(assessment.monthly_payment),
            gds_ratio: round_ratio(assessment.gds),
            tds_ratio: round_ratio(assessment.tds),
            reason,
            monthly_heating: self.monthly_heating,
            is_heating_estimate: self.is_heating_estimate,
            monthly_tax: round_cents(assessment.monthly_tax),
            is_tax_estimate: self.fixed_tax.is_none(),
            monthly_condo_fees: self.monthly_condo_fees,
            monthly_debt_payment: self.monthly_debt_payment,
        })
    }
}

/// Largest feasible grid price in `(lower, upper)`, given `lower` feasible
/// and `upper` infeasible. Both bounds are grid multiples.
fn bisect_price_grid(
    context: &SearchContext,
    mut lower: Money,
    mut upper: Money,
) -> CanfinResult<Money> {
    let mut iterations = 0u32;

    while upper - lower > PRICE_INCREMENT {
        iterations += 1;
        if iterations > MAX_SEARCH_ITERATIONS {
            return Err(CanfinError::ConvergenceFailure {
                function: "mortgage_max_amount".into(),
                iterations,
                last_delta: upper - lower,
            });
        }

        let steps = ((upper - lower) / PRICE_INCREMENT / dec!(2)).floor();
        let midpoint = lower + steps * PRICE_INCREMENT;
        if context.within_limits(midpoint)? {
            lower = midpoint;
        } else {
            upper = midpoint;
        }
        log::trace!(
            target: "canfin::affordability",
            "probe {iterations}: window {lower} - {upper}"
        );
    }

    Ok(lower)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn floor_to_increment(value: Money) -> Money {
    (value / PRICE_INCREMENT).floor() * PRICE_INCREMENT
}

fn ceil_to_increment(value: Money) -> Money {
    (value / PRICE_INCREMENT).ceil() * PRICE_INCREMENT
}

fn round_to_increment(value: Money) -> Money {
    (value / PRICE_INCREMENT).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        * PRICE_INCREMENT
}

fn round_cents(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn round_ratio(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn validate_affordability(input: &AffordabilityInput) -> CanfinResult<()> {
    if input.annual_income <= Decimal::ZERO {
        return Err(CanfinError::InvalidInput {
            field: "annual_income".into(),
            reason: "Annual income must be positive".into(),
        });
    }
    if input.down_payment <= Decimal::ZERO {
        return Err(CanfinError::InvalidInput {
            field: "down_payment".into(),
            reason: "Down payment must be positive".into(),
        });
    }
    if input.annual_rate < Decimal::ZERO {
        return Err(CanfinError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Annual rate cannot be negative".into(),
        });
    }
    if input.annual_rate >= dec!(100) {
        return Err(CanfinError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Annual rate must be below 100 percent".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

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

    fn standard_input() -> AffordabilityInput {
        AffordabilityInput {
            annual_income: dec!(100000),
            down_payment: dec!(25000),
            annual_rate: dec!(5.25),
            options: AffordabilityOptions::default(),
        }
    }

    fn run(input: &AffordabilityInput) -> AffordabilityOutput {
        mortgage_max_amount(input).unwrap().result
    }

    // -----------------------------------------------------------------------
    // 1. Qualifying rate: contract + 2, floored at 5.25
    // -----------------------------------------------------------------------
    #[test]
    fn test_qualifying_rate_spread() {
        let out = run(&standard_input());
        assert_eq!(out.rate_tested, dec!(7.25));
    }

    #[test]
    fn test_qualifying_rate_floor() {
        let input = AffordabilityInput {
            annual_rate: dec!(2),
            ..standard_input()
        };
        let out = run(&input);
        assert_eq!(out.rate_tested, dec!(5.25));
    }

    // -----------------------------------------------------------------------
    // 2. Standard vector: 100k income, 25k down, 5.25% contract
    // -----------------------------------------------------------------------
    #[test]
    fn test_standard_affordability() {
        let out = run(&standard_input());

        // GDS binds at 39% of 8333.33 = 3250/month carrying cost.
        assert_eq!(out.purchase_price, dec!(375000));
        assert_eq!(out.reason, AffordabilityLimit::DebtLimit);
        assert_eq!(out.insurance_premium, dec!(14000));
        assert_eq!(out.mortgage_amount, dec!(364000));
        assert_close(out.monthly_payment, dec!(2605.94), dec!(0.25), "Payment");
        assert_eq!(out.gds_ratio, dec!(0.39));
        assert_eq!(out.tds_ratio, dec!(0.39));
    }

    #[test]
    fn test_standard_expense_defaults() {
        let out = run(&standard_input());
        assert_eq!(out.monthly_heating, dec!(175));
        assert!(out.is_heating_estimate);
        // 1.5% of 375000 per year is 468.75/month.
        assert_eq!(out.monthly_tax, dec!(468.75));
        assert!(out.is_tax_estimate);
        assert_eq!(out.monthly_condo_fees, Decimal::ZERO);
        assert_eq!(out.monthly_debt_payment, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // 3. Down-payment ratio floor caps high incomes at 20x the down payment
    // -----------------------------------------------------------------------
    #[test]
    fn test_down_payment_limit() {
        let input = AffordabilityInput {
            annual_income: dec!(1000000),
            ..standard_input()
        };
        let out = run(&input);

        assert_eq!(out.purchase_price, dec!(500000));
        assert_eq!(out.reason, AffordabilityLimit::DownPaymentLimit);
        // Ratio sits exactly on the 5% minimum: 4.00% premium on 475000.
        assert_eq!(out.insurance_premium, dec!(19000));
        assert_eq!(out.mortgage_amount, dec!(494000));
        assert!(out.gds_ratio < GDS_LIMIT);
    }

    // -----------------------------------------------------------------------
    // 4. Price ceiling caps unconstrained buyers
    // -----------------------------------------------------------------------
    #[test]
    fn test_max_purchase_price_cap() {
        let input = AffordabilityInput {
            annual_income: dec!(10000000),
            down_payment: dec!(2000000),
            ..standard_input()
        };
        let out = run(&input);

        assert_eq!(out.purchase_price, dec!(10000000));
        assert_eq!(out.reason, AffordabilityLimit::MaxPurchasePrice);
        // 20% down on the capped price needs no insurance.
        assert_eq!(out.insurance_premium, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // 5. Other debt tightens the TDS limit
    // -----------------------------------------------------------------------
    #[test]
    fn test_debt_reduces_affordability() {
        let input = AffordabilityInput {
            options: AffordabilityOptions {
                monthly_debt_payment: Some(dec!(1000)),
                ..AffordabilityOptions::default()
            },
            ..standard_input()
        };
        let out = run(&input);

        // TDS at 44% leaves 32% of income for housing, below the GDS room.
        assert_eq!(out.purchase_price, dec!(307000));
        assert_eq!(out.reason, AffordabilityLimit::DebtLimit);
        assert!(out.tds_ratio <= TDS_LIMIT);
        assert_eq!(out.monthly_debt_payment, dec!(1000));
    }

    // -----------------------------------------------------------------------
    // 6. Supplied expenses replace the estimates
    // -----------------------------------------------------------------------
    #[test]
    fn test_supplied_expenses() {
        let input = AffordabilityInput {
            options: AffordabilityOptions {
                monthly_heating: Some(dec!(250)),
                monthly_tax: Some(dec!(400)),
                ..AffordabilityOptions::default()
            },
            ..standard_input()
        };
        let out = run(&input);

        assert_eq!(out.monthly_heating, dec!(250));
        assert!(!out.is_heating_estimate);
        assert_eq!(out.monthly_tax, dec!(400));
        assert!(!out.is_tax_estimate);
    }

    // -----------------------------------------------------------------------
    // 7. Fixed obligations beyond the caps produce an empty result
    // -----------------------------------------------------------------------
    #[test]
    fn test_empty_feasible_set() {
        let input = AffordabilityInput {
            annual_income: dec!(24000),
            options: AffordabilityOptions {
                monthly_condo_fees: Some(dec!(700)),
                monthly_tax: Some(dec!(800)),
                ..AffordabilityOptions::default()
            },
            ..standard_input()
        };
        let output = mortgage_max_amount(&input).unwrap();
        let out = &output.result;

        assert_eq!(out.purchase_price, Decimal::ZERO);
        assert_eq!(out.mortgage_amount, Decimal::ZERO);
        assert_eq!(out.reason, AffordabilityLimit::DebtLimit);
        assert!(out.gds_ratio > GDS_LIMIT);
        assert!(!output.warnings.is_empty());
    }

    // -----------------------------------------------------------------------
    // 8. Validation failures
    // -----------------------------------------------------------------------
    #[test]
    fn test_non_positive_income_rejected() {
        let input = AffordabilityInput {
            annual_income: Decimal::ZERO,
            ..standard_input()
        };
        assert!(matches!(
            mortgage_max_amount(&input),
            Err(CanfinError::InvalidInput { ref field, .. }) if field == "annual_income"
        ));
    }

    #[test]
    fn test_non_positive_down_payment_rejected() {
        let input = AffordabilityInput {
            down_payment: dec!(-5),
            ..standard_input()
        };
        assert!(matches!(
            mortgage_max_amount(&input),
            Err(CanfinError::InvalidInput { ref field, .. }) if field == "down_payment"
        ));
    }

    // -----------------------------------------------------------------------
    // 9. Result invariants
    // -----------------------------------------------------------------------
    #[test]
    fn test_price_lands_on_increment() {
        let out = run(&standard_input());
        assert!((out.purchase_price % PRICE_INCREMENT).is_zero());
        assert!((out.mortgage_amount % PRICE_INCREMENT).is_zero());
    }

    #[test]
    fn test_down_payment_ratio_never_below_minimum() {
        let input = AffordabilityInput {
            annual_income: dec!(500000),
            down_payment: dec!(20000),
            ..standard_input()
        };
        let out = run(&input);
        assert!(out.purchase_price <= dec!(400000));
        assert!(
            out.down_payment / out.purchase_price >= MIN_INSURABLE_DOWN_RATIO,
            "Ratio {} fell below the insurable minimum",
            out.down_payment / out.purchase_price
        );
    }

    // -----------------------------------------------------------------------
    // 10. Reason labels serialize to their wire names
    // -----------------------------------------------------------------------
    #[test]
    fn test_reason_labels() {
        assert_eq!(AffordabilityLimit::DebtLimit.to_string(), "debt limit");
        assert_eq!(
            serde_json::to_value(AffordabilityLimit::DownPaymentLimit).unwrap(),
            serde_json::json!("downPayment limit")
        );
        assert_eq!(
            serde_json::to_value(AffordabilityLimit::MaxPurchasePrice).unwrap(),
            serde_json::json!("max purchase price")
        );
    }
}
