//! Collateral module - tranche release schedule and withdrawable collateral.

mod collateral_model;
pub mod tranche_calculator;

pub use collateral_model::{CollateralSchedule, Tranche};
pub use tranche_calculator::calculate_collateral_schedule;
