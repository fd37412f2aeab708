pub mod assumptions;
pub mod discount;
pub mod forecast;
pub mod growth;
pub mod implied;
pub mod margin_tax;
pub mod terminal;
pub mod wacc_schedule;

pub use assumptions::{AssumptionSet, CapitalWeights, GrowthPhases, ReinvestmentBasis};
pub use discount::{run_dcf, DcfOutput, YearlyProjection};
pub use implied::find_implied_growth;
pub use wacc_schedule::WaccSchedule;
