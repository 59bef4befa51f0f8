pub mod error;
pub mod types;

#[cfg(feature = "mortgage")]
pub mod mortgage;

#[cfg(feature = "inflation")]
pub mod inflation;

#[cfg(feature = "market_data")]
pub mod market_data;

pub use error::CanfinError;
pub use types::*;

/// Standard result type for all canfin operations
pub type CanfinResult<T> = Result<T, CanfinError>;
