use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use canfin_core::mortgage::{
    mortgage_max_amount, mortgage_payments, premium_amount, AffordabilityInput,
    AffordabilityLimit, AffordabilityOptions, MortgagePaymentsInput, PaymentFrequency,
    ScheduleOptions,
};

// ===========================================================================
// Schedule tests
// ===========================================================================

fn standard_mortgage() -> MortgagePaymentsInput {
    MortgagePaymentsInput {
        mortgage_amount: dec!(250000),
        annual_rate: dec!(6),
        frequency: PaymentFrequency::Monthly,
        term_years: 5,
        amortization_years: 25,
        options: ScheduleOptions::default(),
    }
}

#[test]
fn test_full_amortization_retires_principal() {
    let input = MortgagePaymentsInput {
        term_years: 25,
        ..standard_mortgage()
    };
    let rows = mortgage_payments(&input).unwrap().result;

    assert_eq!(rows.len(), 300);
    let last = &rows[299];
    assert_eq!(last.remaining_balance, Decimal::ZERO);
    // Every dollar of principal comes back: 250k across 300 payments.
    assert!((last.cumulative_capital_paid - dec!(250000)).abs() < dec!(0.02));
    // Total interest on a 25-year 6% mortgage is roughly 229k.
    assert!((last.cumulative_interest_paid - dec!(229851)).abs() < dec!(50));
}

#[test]
fn test_accelerated_frequencies_save_interest() {
    let monthly = mortgage_payments(&standard_mortgage()).unwrap().result;
    let accel_biweekly = mortgage_payments(&MortgagePaymentsInput {
        frequency: PaymentFrequency::AcceleratedBiWeekly,
        ..standard_mortgage()
    })
    .unwrap()
    .result;
    let accel_weekly = mortgage_payments(&MortgagePaymentsInput {
        frequency: PaymentFrequency::AcceleratedWeekly,
        ..standard_mortgage()
    })
    .unwrap()
    .result;

    // Same five calendar years, more principal retired, less interest accrued.
    let monthly_interest = monthly.last().unwrap().cumulative_interest_paid;
    let biweekly_interest = accel_biweekly.last().unwrap().cumulative_interest_paid;
    let weekly_interest = accel_weekly.last().unwrap().cumulative_interest_paid;

    assert!(biweekly_interest < monthly_interest);
    assert!(weekly_interest < monthly_interest);
    assert!(
        accel_biweekly.last().unwrap().remaining_balance
            < monthly.last().unwrap().remaining_balance
    );
}

#[test]
fn test_schedule_wire_format() {
    let json = r#"{
        "mortgage_amount": 250000,
        "annual_rate": 6,
        "frequency": "acceleratedBiWeekly",
        "term_years": 5,
        "amortization_years": 25
    }"#;
    let input: MortgagePaymentsInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.frequency, PaymentFrequency::AcceleratedBiWeekly);

    let output = mortgage_payments(&input).unwrap();
    assert_eq!(output.result.len(), 130);

    // Rows without an id must not carry an id key on the wire.
    let row_json = serde_json::to_value(&output.result[0]).unwrap();
    assert!(row_json.get("id").is_none());
    assert!(row_json.get("payment_amount").is_some());
}

// ===========================================================================
// Affordability composition tests
// ===========================================================================

fn standard_affordability() -> AffordabilityInput {
    AffordabilityInput {
        annual_income: dec!(100000),
        down_payment: dec!(25000),
        annual_rate: dec!(5.25),
        options: AffordabilityOptions::default(),
    }
}

#[test]
fn test_affordability_consistent_with_schedule_and_premium() {
    let affordability = mortgage_max_amount(&standard_affordability()).unwrap().result;

    // The premium the estimator capitalized matches the premium calculator.
    let premium =
        premium_amount(affordability.purchase_price, affordability.down_payment).unwrap();
    assert_eq!(premium, affordability.insurance_premium);

    // A schedule at the qualifying rate over the qualifying amortization
    // reproduces the monthly payment the ratios were built from.
    let schedule = mortgage_payments(&MortgagePaymentsInput {
        mortgage_amount: affordability.mortgage_amount,
        annual_rate: affordability.rate_tested,
        frequency: PaymentFrequency::Monthly,
        term_years: 25,
        amortization_years: 25,
        options: ScheduleOptions::default(),
    })
    .unwrap()
    .result;

    let payment_difference = (schedule[0].payment_amount - affordability.monthly_payment).abs();
    assert!(
        payment_difference < dec!(0.02),
        "Schedule payment {} diverges from affordability payment {}",
        schedule[0].payment_amount,
        affordability.monthly_payment
    );
}

#[test]
fn test_affordability_result_respects_caps() {
    let affordability = mortgage_max_amount(&standard_affordability()).unwrap().result;

    // Reported ratios sit at or under the caps.
    assert!(affordability.gds_ratio <= dec!(0.39));
    assert!(affordability.tds_ratio <= dec!(0.44));
    // The next grid step would breach a cap, so the result is tight.
    assert_eq!(affordability.reason, AffordabilityLimit::DebtLimit);
    assert_eq!(affordability.purchase_price, dec!(375000));
}

#[test]
fn test_small_down_payment_binds_on_ratio_floor() {
    let input = AffordabilityInput {
        down_payment: dec!(1000),
        ..standard_affordability()
    };
    let affordability = mortgage_max_amount(&input).unwrap().result;

    // 20x the down payment caps the price long before the debt limits.
    assert_eq!(affordability.purchase_price, dec!(20000));
    assert_eq!(affordability.reason, AffordabilityLimit::DownPaymentLimit);
}

// ===========================================================================
// Envelope tests
// ===========================================================================

#[test]
fn test_envelope_metadata() {
    let output = mortgage_payments(&standard_mortgage()).unwrap();

    assert_eq!(output.metadata.precision, "rust_decimal_128bit");
    assert!(!output.metadata.version.is_empty());
    assert!(!output.methodology.is_empty());
    // Assumptions echo the input for auditability.
    assert_eq!(
        output.assumptions.get("annual_rate").cloned(),
        Some(serde_json::json!("6"))
    );
}

#[test]
fn test_identical_inputs_identical_results() {
    let first = mortgage_max_amount(&standard_affordability()).unwrap();
    let second = mortgage_max_amount(&standard_affordability()).unwrap();

    assert_eq!(
        serde_json::to_value(&first.result).unwrap(),
        serde_json::to_value(&second.result).unwrap()
    );
}
