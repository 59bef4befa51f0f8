use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use canfin_core::inflation::{self, InflationInput};

use crate::input;

/// Arguments for CPI inflation adjustment
#[derive(Args)]
pub struct InflationArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount in source-period dollars
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// CPI reading for the period the amount is stated in
    #[arg(long)]
    pub source_cpi: Option<Decimal>,

    /// CPI reading for the period to restate the amount in
    #[arg(long)]
    pub target_cpi: Option<Decimal>,

    /// Decimal places for the adjusted amount
    #[arg(long)]
    pub decimals: Option<u32>,
}

pub fn run_inflation(args: InflationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inflation_input: InflationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        InflationInput {
            amount: args
                .amount
                .ok_or("--amount is required (or provide --input)")?,
            source_cpi: args
                .source_cpi
                .ok_or("--source-cpi is required (or provide --input)")?,
            target_cpi: args
                .target_cpi
                .ok_or("--target-cpi is required (or provide --input)")?,
            decimals: args.decimals,
        }
    };

    let result = inflation::adjust_for_inflation(&inflation_input)?;
    Ok(serde_json::to_value(result)?)
}
