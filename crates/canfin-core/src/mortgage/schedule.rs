//! Amortization schedules under the Canadian semi-annual compounding
//! convention.
//!
//! Payments are sized with the level-payment annuity formula at the
//! frequency-adjusted periodic rate, then the balance is reduced period by
//! period. Accelerated frequencies keep the payment amount derived from the
//! monthly schedule (divided by 4 weekly, by 2 bi-weekly) and apply it at the
//! faster cadence, which is what shortens the true amortization. Rows cover
//! the term only; internal accumulators stay unrounded and monetary fields
//! round at emission.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::CanfinError;
use crate::mortgage::rates::{periodic_rate, RateSpec};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::CanfinResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default decimal places for emitted monetary fields.
const DEFAULT_DECIMALS: u32 = 2;

/// Default compounding periods behind a quoted rate (semi-annual).
const DEFAULT_ANNUAL_COMPOUNDING: u32 = 2;

/// Longest supported amortization period in years.
const MAX_AMORTIZATION_YEARS: u32 = 50;

/// Residual balance below this is treated as paid off.
const BALANCE_EPSILON: Decimal = dec!(0.000001);

const MONTHS_PER_YEAR: u32 = 12;

// ---------------------------------------------------------------------------
// Payment frequency
// ---------------------------------------------------------------------------

/// How often payments are made.
///
/// The accelerated variants make the monthly payment's quarter (weekly) or
/// half (bi-weekly) at the faster cadence instead of sizing a smaller level
/// payment, so they retire principal ahead of the stated amortization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentFrequency {
    Weekly,
    BiWeekly,
    SemiMonthly,
    Monthly,
    AcceleratedWeekly,
    AcceleratedBiWeekly,
}

impl PaymentFrequency {
    /// Number of payments (and interest periods) per year.
    pub fn payments_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => 52,
            PaymentFrequency::BiWeekly | PaymentFrequency::AcceleratedBiWeekly => 26,
            PaymentFrequency::SemiMonthly => 24,
            PaymentFrequency::Monthly => 12,
        }
    }

    /// Divisor applied to the monthly payment for accelerated variants.
    fn accelerated_divisor(self) -> Option<Decimal> {
        match self {
            PaymentFrequency::AcceleratedWeekly => Some(dec!(4)),
            PaymentFrequency::AcceleratedBiWeekly => Some(dec!(2)),
            _ => None,
        }
    }

    pub fn is_accelerated(self) -> bool {
        self.accelerated_divisor().is_some()
    }

    fn name(self) -> &'static str {
        match self {
            PaymentFrequency::Weekly => "weekly",
            PaymentFrequency::BiWeekly => "biWeekly",
            PaymentFrequency::SemiMonthly => "semiMonthly",
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::AcceleratedWeekly => "acceleratedWeekly",
            PaymentFrequency::AcceleratedBiWeekly => "acceleratedBiWeekly",
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaymentFrequency {
    type Err = String;

    /// Accepts the canonical camelCase names plus kebab-case and lowercase
    /// forms (`bi-weekly`, `acceleratedbiweekly`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "weekly" => Ok(PaymentFrequency::Weekly),
            "biweekly" => Ok(PaymentFrequency::BiWeekly),
            "semimonthly" => Ok(PaymentFrequency::SemiMonthly),
            "monthly" => Ok(PaymentFrequency::Monthly),
            "acceleratedweekly" => Ok(PaymentFrequency::AcceleratedWeekly),
            "acceleratedbiweekly" => Ok(PaymentFrequency::AcceleratedBiWeekly),
            _ => Err(format!("unknown payment frequency: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Optional schedule knobs; defaults match the standard disclosure schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleOptions {
    /// Caller-supplied identifier copied verbatim onto every row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Decimal places for emitted monetary fields (default 2).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
    /// Compounding periods behind the quoted rate (default 2, semi-annual).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_compounding: Option<u32>,
    /// Route per-period diagnostics to the logging facade.
    #[serde(default)]
    pub debug: bool,
}

/// Amortization schedule input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgagePaymentsInput {
    /// Principal advanced at the start of the schedule.
    pub mortgage_amount: Money,
    /// Quoted annual rate in percentage points (6 = 6%).
    pub annual_rate: Percent,
    /// Payment frequency.
    pub frequency: PaymentFrequency,
    /// Term covered by the schedule, in years.
    pub term_years: u32,
    /// Amortization period the payment is sized against, in years.
    pub amortization_years: u32,
    #[serde(default)]
    pub options: ScheduleOptions,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One scheduled payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// Payment number, 0-based.
    pub payment_index: u32,
    /// Amount due this period.
    pub payment_amount: Money,
    /// Interest portion of the payment.
    pub interest_portion: Money,
    /// Principal portion of the payment.
    pub capital_portion: Money,
    /// Balance after this payment.
    pub remaining_balance: Money,
    /// Total paid through this period.
    pub cumulative_paid: Money,
    /// Total interest paid through this period.
    pub cumulative_interest_paid: Money,
    /// Total principal repaid through this period.
    pub cumulative_capital_paid: Money,
    /// Identifier from `ScheduleOptions::id`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Unrounded per-period state offered to observers.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodDiagnostics {
    pub payment_index: u32,
    pub periodic_rate: Rate,
    pub interest_accrued: Money,
    pub principal_applied: Money,
    pub balance_before: Money,
    pub balance_after: Money,
}

/// Sink for per-period diagnostics.
///
/// [`mortgage_payments`] wires this to `log::debug!` when `options.debug` is
/// set; callers that want structured capture inject their own through
/// [`mortgage_payments_observed`].
pub trait AmortizationObserver {
    fn on_period(&mut self, diagnostics: &PeriodDiagnostics);
}

struct LogObserver;

impl AmortizationObserver for LogObserver {
    fn on_period(&mut self, d: &PeriodDiagnostics) {
        log::debug!(
            target: "canfin::amortization",
            "period {}: balance {} -> {} (interest {}, principal {})",
            d.payment_index,
            d.balance_before,
            d.balance_after,
            d.interest_accrued,
            d.principal_applied
        );
    }
}

struct NoopObserver;

impl AmortizationObserver for NoopObserver {
    fn on_period(&mut self, _diagnostics: &PeriodDiagnostics) {}
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate the amortization schedule for a mortgage over its term.
pub fn mortgage_payments(
    input: &MortgagePaymentsInput,
) -> CanfinResult<ComputationOutput<Vec<AmortizationRow>>> {
    if input.options.debug {
        mortgage_payments_observed(input, &mut LogObserver)
    } else {
        mortgage_payments_observed(input, &mut NoopObserver)
    }
}

/// Generate the schedule, feeding every active period to `observer`.
pub fn mortgage_payments_observed(
    input: &MortgagePaymentsInput,
    observer: &mut dyn AmortizationObserver,
) -> CanfinResult<ComputationOutput<Vec<AmortizationRow>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_payments(input)?;

    let rate_spec = RateSpec {
        nominal_annual_rate: input.annual_rate / dec!(100),
        compounding_periods_per_year: input
            .options
            .annual_compounding
            .unwrap_or(DEFAULT_ANNUAL_COMPOUNDING),
    };
    let payments_per_year = input.frequency.payments_per_year();
    let rate = periodic_rate(&rate_spec, payments_per_year);

    let payment = match input.frequency.accelerated_divisor() {
        Some(divisor) => {
            let monthly_rate = periodic_rate(&rate_spec, MONTHS_PER_YEAR);
            let monthly_payment = level_payment(
                input.mortgage_amount,
                monthly_rate,
                MONTHS_PER_YEAR * input.amortization_years,
            );
            monthly_payment / divisor
        }
        None => level_payment(
            input.mortgage_amount,
            rate,
            payments_per_year * input.amortization_years,
        ),
    };

    let total_rows = payments_per_year * input.term_years;
    let decimals = input.options.decimals.unwrap_or(DEFAULT_DECIMALS);

    let mut rows = Vec::with_capacity(total_rows as usize);
    let mut balance = input.mortgage_amount;
    let mut cumulative_paid = Decimal::ZERO;
    let mut cumulative_interest = Decimal::ZERO;
    let mut cumulative_capital = Decimal::ZERO;
    let mut active_payments: u32 = 0;

    for payment_index in 0..total_rows {
        if balance < BALANCE_EPSILON {
            // Paid off early (accelerated schedules); keep the row count.
            rows.push(AmortizationRow {
                payment_index,
                payment_amount: Decimal::ZERO,
                interest_portion: Decimal::ZERO,
                capital_portion: Decimal::ZERO,
                remaining_balance: Decimal::ZERO,
                cumulative_paid: round_money(cumulative_paid, decimals),
                cumulative_interest_paid: round_money(cumulative_interest, decimals),
                cumulative_capital_paid: round_money(cumulative_capital, decimals),
                id: input.options.id.clone(),
            });
            continue;
        }

        let balance_before = balance;
        let interest = balance * rate;
        let mut capital = payment - interest;
        if capital < Decimal::ZERO {
            capital = Decimal::ZERO;
        }
        // Final payment only covers what is left.
        if capital > balance {
            capital = balance;
        }
        let payment_due = interest + capital;

        balance -= capital;
        if balance < BALANCE_EPSILON {
            balance = Decimal::ZERO;
        }

        cumulative_paid += payment_due;
        cumulative_interest += interest;
        cumulative_capital += capital;
        active_payments += 1;

        observer.on_period(&PeriodDiagnostics {
            payment_index,
            periodic_rate: rate,
            interest_accrued: interest,
            principal_applied: capital,
            balance_before,
            balance_after: balance,
        });

        rows.push(AmortizationRow {
            payment_index,
            payment_amount: round_money(payment_due, decimals),
            interest_portion: round_money(interest, decimals),
            capital_portion: round_money(capital, decimals),
            remaining_balance: round_money(balance, decimals),
            cumulative_paid: round_money(cumulative_paid, decimals),
            cumulative_interest_paid: round_money(cumulative_interest, decimals),
            cumulative_capital_paid: round_money(cumulative_capital, decimals),
            id: input.options.id.clone(),
        });
    }

    if active_payments < total_rows {
        warnings.push(format!(
            "Mortgage fully repaid after {active_payments} of {total_rows} scheduled payments"
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-Payment Amortization (semi-annual compounding)",
        input,
        warnings,
        elapsed,
        rows,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Level payment that amortizes `balance` over `periods` at rate `rate`.
pub(crate) fn level_payment(balance: Money, rate: Rate, periods: u32) -> Money {
    if rate.is_zero() {
        return balance / Decimal::from(periods);
    }
    let factor = (Decimal::ONE + rate).powd(Decimal::from(periods));
    balance * (rate * factor / (factor - Decimal::ONE))
}

fn round_money(value: Money, decimals: u32) -> Money {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

fn validate_payments(input: &MortgagePaymentsInput) -> CanfinResult<()> {
    if input.mortgage_amount <= Decimal::ZERO {
        return Err(CanfinError::InvalidInput {
            field: "mortgage_amount".into(),
            reason: "Mortgage amount must be positive".into(),
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
    if input.term_years == 0 {
        return Err(CanfinError::InvalidInput {
            field: "term_years".into(),
            reason: "Term must be at least one year".into(),
        });
    }
    if input.amortization_years < input.term_years {
        return Err(CanfinError::InvalidConfiguration {
            field: "amortization_years".into(),
            reason: "Amortization period cannot be shorter than the term".into(),
        });
    }
    if input.amortization_years > MAX_AMORTIZATION_YEARS {
        return Err(CanfinError::InvalidInput {
            field: "amortization_years".into(),
            reason: format!("Amortization period cannot exceed {MAX_AMORTIZATION_YEARS} years"),
        });
    }
    if input.options.annual_compounding == Some(0) {
        return Err(CanfinError::InvalidInput {
            field: "annual_compounding".into(),
            reason: "Compounding periods per year must be at least 1".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
