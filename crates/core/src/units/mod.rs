//! Ledger unit conversion - base-unit integers and their decimal amounts.

mod unit_converter;
mod units_model;

pub use unit_converter::UnitConverter;
pub use units_model::BaseUnits;
