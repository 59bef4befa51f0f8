use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanfinError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration: {field} — {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Malformed data: {0}")]
    DataFormat(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CanfinError {
    fn from(e: serde_json::Error) -> Self {
        CanfinError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "market_data")]
impl From<reqwest::Error> for CanfinError {
    fn from(e: reqwest::Error) -> Self {
        CanfinError::Network(e.to_string())
    }
}

#[cfg(feature = "market_data")]
impl From<csv::Error> for CanfinError {
    fn from(e: csv::Error) -> Self {
        CanfinError::DataFormat(e.to_string())
    }
}
