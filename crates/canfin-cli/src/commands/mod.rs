pub mod inflation;
pub mod market_data;
pub mod mortgage;
