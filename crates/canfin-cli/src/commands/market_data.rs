use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use canfin_core::market_data::{self, HistoricalPricesInput, PriceInterval, PriceVariable};

use crate::input;

/// Arguments for historical price downloads
#[derive(Args)]
pub struct PricesArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Ticker symbol (^GSPTSE, XIU.TO, ...)
    #[arg(long)]
    pub symbol: Option<String>,

    /// First date to include, YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last date to include, YYYY-MM-DD
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Price variable (open, high, low, close, adjClose, volume)
    #[arg(long)]
    pub variable: Option<PriceVariable>,

    /// Sampling interval (daily, weekly, monthly)
    #[arg(long)]
    pub interval: Option<PriceInterval>,
}

pub fn run_prices(args: PricesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let prices_input: HistoricalPricesInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        HistoricalPricesInput {
            symbol: args
                .symbol
                .ok_or("--symbol is required (or provide --input)")?,
            start_date: args
                .start_date
                .ok_or("--start-date is required (or provide --input)")?,
            end_date: args
                .end_date
                .ok_or("--end-date is required (or provide --input)")?,
            variable: args.variable.unwrap_or_default(),
            interval: args.interval.unwrap_or_default(),
        }
    };

    let result = market_data::historical_prices(&prices_input)?;
    Ok(serde_json::to_value(result)?)
}
