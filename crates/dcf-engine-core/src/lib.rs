pub mod error;
pub mod schedule;
pub mod types;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "synergy")]
pub mod synergy;

pub use error::ValuationError;
pub use types::*;

/// Standard result type for all valuation-engine operations
pub type EngineResult<T> = Result<T, ValuationError>;
