use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use canfin_core::mortgage::{
    self, AffordabilityInput, AffordabilityOptions, InsurancePremiumInput, MortgagePaymentsInput,
    PaymentFrequency, ScheduleOptions,
};

use crate::input;

/// Arguments for the default-insurance premium calculation
#[derive(Args)]
pub struct PremiumArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price of the property
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Down payment applied against the price
    #[arg(long)]
    pub down_payment: Option<Decimal>,
}

/// Arguments for amortization schedule generation
#[derive(Args)]
pub struct PaymentsArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal advanced at the start of the schedule
    #[arg(long)]
    pub mortgage_amount: Option<Decimal>,

    /// Quoted annual rate in percentage points (6 = 6%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Payment frequency (monthly, biWeekly, acceleratedWeekly, ...)
    #[arg(long)]
    pub frequency: Option<PaymentFrequency>,

    /// Term covered by the schedule, in years
    #[arg(long)]
    pub term_years: Option<u32>,

    /// Amortization period the payment is sized against, in years
    #[arg(long)]
    pub amortization_years: Option<u32>,

    /// Identifier copied onto every row
    #[arg(long)]
    pub id: Option<String>,

    /// Decimal places for monetary fields
    #[arg(long)]
    pub decimals: Option<u32>,

    /// Compounding periods behind the quoted rate (default 2, semi-annual)
    #[arg(long)]
    pub annual_compounding: Option<u32>,

    /// Log per-period diagnostics to stderr
    #[arg(long)]
    pub debug: bool,
}

/// Arguments for the affordability estimate
#[derive(Args)]
pub struct MaxAmountArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross annual household income
    #[arg(long)]
    pub annual_income: Option<Decimal>,

    /// Cash available as a down payment
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Contract annual rate in percentage points (5.25 = 5.25%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Monthly non-housing debt payments
    #[arg(long)]
    pub monthly_debt_payment: Option<Decimal>,

    /// Monthly heating costs
    #[arg(long)]
    pub monthly_heating: Option<Decimal>,

    /// Monthly property tax
    #[arg(long)]
    pub monthly_tax: Option<Decimal>,

    /// Monthly condo fees
    #[arg(long)]
    pub monthly_condo_fees: Option<Decimal>,
}

pub fn run_premium(args: PremiumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let premium_input: InsurancePremiumInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        InsurancePremiumInput {
            purchase_price: args
                .purchase_price
                .ok_or("--purchase-price is required (or provide --input)")?,
            down_payment: args
                .down_payment
                .ok_or("--down-payment is required (or provide --input)")?,
        }
    };

    let result = mortgage::mortgage_insurance_premium(&premium_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_payments(args: PaymentsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut payments_input: MortgagePaymentsInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        MortgagePaymentsInput {
            mortgage_amount: args
                .mortgage_amount
                .ok_or("--mortgage-amount is required (or provide --input)")?,
            annual_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            frequency: args
                .frequency
                .ok_or("--frequency is required (or provide --input)")?,
            term_years: args
                .term_years
                .ok_or("--term-years is required (or provide --input)")?,
            amortization_years: args
                .amortization_years
                .ok_or("--amortization-years is required (or provide --input)")?,
            options: ScheduleOptions {
                id: args.id,
                decimals: args.decimals,
                annual_compounding: args.annual_compounding,
                debug: false,
            },
        }
    };
    // The flag also applies to file and stdin inputs.
    payments_input.options.debug |= args.debug;

    let result = mortgage::mortgage_payments(&payments_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_max_amount(args: MaxAmountArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let affordability_input: AffordabilityInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        AffordabilityInput {
            annual_income: args
                .annual_income
                .ok_or("--annual-income is required (or provide --input)")?,
            down_payment: args
                .down_payment
                .ok_or("--down-payment is required (or provide --input)")?,
            annual_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            options: AffordabilityOptions {
                monthly_debt_payment: args.monthly_debt_payment,
                monthly_heating: args.monthly_heating,
                monthly_tax: args.monthly_tax,
                monthly_condo_fees: args.monthly_condo_fees,
            },
        }
    };

    let result = mortgage::mortgage_max_amount(&affordability_input)?;
    Ok(serde_json::to_value(result)?)
}
