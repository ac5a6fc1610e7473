pub mod errors;
pub mod ml;
pub mod player;
pub mod records;
pub mod valuation;
