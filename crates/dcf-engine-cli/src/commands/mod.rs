pub mod synergy;
pub mod valuation;
