pub mod composer;
pub mod discount;
pub mod schedule;

pub use composer::{
    value_with_synergies, CompositionTargets, MarginOfSafetyTarget, SynergyAdjustedOutput,
    SynergyInput,
};
pub use discount::{blended_wacc, BlendedWaccInput, BuyerDiscount, SynergyScheduleEntry};
pub use schedule::{RampShape, SynergyCategory, SynergyDriver};
