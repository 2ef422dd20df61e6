//! Revenue log normalization.

mod revenue_mapper;
mod revenue_model;

pub use revenue_mapper::{map_revenue_entries, total_revenue};
pub use revenue_model::{RawRevenueEntry, RevenueRecord};
