//! Historical price retrieval.
//!
//! Downloads daily/weekly/monthly price history for a symbol as CSV and
//! extracts one column as a time series. URL construction and CSV parsing are
//! plain functions so they can be tested without touching the network; only
//! [`historical_prices`] performs I/O.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::CanfinError;
use crate::types::{with_metadata, ComputationOutput};
use crate::CanfinResult;

const DOWNLOAD_BASE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/download";

const SECONDS_PER_DAY: i64 = 86_400;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Which price column to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceVariable {
    Open,
    High,
    Low,
    Close,
    #[default]
    AdjClose,
    Volume,
}

impl PriceVariable {
    /// Column position in the download CSV (Date is column 0).
    fn column_index(self) -> usize {
        match self {
            PriceVariable::Open => 1,
            PriceVariable::High => 2,
            PriceVariable::Low => 3,
            PriceVariable::Close => 4,
            PriceVariable::AdjClose => 5,
            PriceVariable::Volume => 6,
        }
    }

    fn name(self) -> &'static str {
        match self {
            PriceVariable::Open => "open",
            PriceVariable::High => "high",
            PriceVariable::Low => "low",
            PriceVariable::Close => "close",
            PriceVariable::AdjClose => "adjClose",
            PriceVariable::Volume => "volume",
        }
    }
}

impl fmt::Display for PriceVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PriceVariable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_' && *c != ' ')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "open" => Ok(PriceVariable::Open),
            "high" => Ok(PriceVariable::High),
            "low" => Ok(PriceVariable::Low),
            "close" => Ok(PriceVariable::Close),
            "adjclose" => Ok(PriceVariable::AdjClose),
            "volume" => Ok(PriceVariable::Volume),
            _ => Err(format!("unknown price variable: {s}")),
        }
    }
}

/// Sampling interval of the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceInterval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl PriceInterval {
    fn code(self) -> &'static str {
        match self {
            PriceInterval::Daily => "1d",
            PriceInterval::Weekly => "1wk",
            PriceInterval::Monthly => "1mo",
        }
    }
}

impl fmt::Display for PriceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PriceInterval::Daily => "daily",
            PriceInterval::Weekly => "weekly",
            PriceInterval::Monthly => "monthly",
        };
        f.write_str(label)
    }
}

impl FromStr for PriceInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "1d" => Ok(PriceInterval::Daily),
            "weekly" | "1wk" => Ok(PriceInterval::Weekly),
            "monthly" | "1mo" => Ok(PriceInterval::Monthly),
            _ => Err(format!("unknown price interval: {s}")),
        }
    }
}

/// Historical price request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalPricesInput {
    /// Ticker symbol as the data provider knows it.
    pub symbol: String,
    /// First date of the range (inclusive).
    pub start_date: NaiveDate,
    /// Last date of the range (inclusive).
    pub end_date: NaiveDate,
    /// Price column to extract (default adjusted close).
    #[serde(default)]
    pub variable: PriceVariable,
    /// Sampling interval (default daily).
    #[serde(default)]
    pub interval: PriceInterval,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One observation in the series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: NaiveDate,
    pub value: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fetch the price series for a symbol over a date range.
pub fn historical_prices(
    input: &HistoricalPricesInput,
) -> CanfinResult<ComputationOutput<Vec<PricePoint>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_request(input)?;

    let url = download_url(input);
    log::debug!(target: "canfin::market_data", "GET {url}");

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("canfin/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let response = client.get(&url).send()?;
    if !response.status().is_success() {
        return Err(CanfinError::Network(format!(
            "price download for {} returned HTTP {}",
            input.symbol,
            response.status()
        )));
    }
    let body = response.text()?;

    let points = parse_price_csv(&body, input.variable)?;
    if points.is_empty() {
        warnings.push(format!("No price rows returned for {}", input.symbol));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Historical Price Download (CSV)",
        input,
        warnings,
        elapsed,
        points,
    ))
}

/// Download URL for a request. The provider treats `period2` as an exclusive
/// bound, so one day is added to keep `end_date` in the range.
pub fn download_url(input: &HistoricalPricesInput) -> String {
    let period1 = to_unix_seconds(input.start_date);
    let period2 = to_unix_seconds(input.end_date) + SECONDS_PER_DAY;
    format!(
        "{DOWNLOAD_BASE_URL}/{}?period1={period1}&period2={period2}&interval={}&events=history",
        input.symbol,
        input.interval.code()
    )
}

/// Parse a download CSV body into a series of the requested column.
///
/// Rows where the column reads `null` (market holidays) are skipped.
pub fn parse_price_csv(body: &str, variable: PriceVariable) -> CanfinResult<Vec<PricePoint>> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.get(0) != Some("Date") {
        return Err(CanfinError::DataFormat(
            "Price CSV does not start with a Date column".into(),
        ));
    }

    let column = variable.column_index();
    let mut points = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let date_field = record.get(0).ok_or_else(|| {
            CanfinError::DataFormat(format!("Price CSV row {row} is missing the date"))
        })?;
        let value_field = record.get(column).ok_or_else(|| {
            CanfinError::DataFormat(format!("Price CSV row {row} is missing column {variable}"))
        })?;

        if value_field == "null" {
            continue;
        }

        let timestamp = NaiveDate::parse_from_str(date_field, "%Y-%m-%d").map_err(|e| {
            CanfinError::DataFormat(format!("Price CSV row {row} has a bad date: {e}"))
        })?;
        let value = Decimal::from_str(value_field).map_err(|e| {
            CanfinError::DataFormat(format!("Price CSV row {row} has a bad value: {e}"))
        })?;

        points.push(PricePoint { timestamp, value });
    }

    Ok(points)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_unix_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn validate_request(input: &HistoricalPricesInput) -> CanfinResult<()> {
    if input.symbol.trim().is_empty() {
        return Err(CanfinError::InvalidInput {
            field: "symbol".into(),
            reason: "Symbol cannot be empty".into(),
        });
    }
    if input.start_date > input.end_date {
        return Err(CanfinError::InvalidInput {
            field: "start_date".into(),
            reason: "Start date cannot be after the end date".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
