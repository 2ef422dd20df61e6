use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::units::BaseUnits;

/// A revenue log row as returned by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawRevenueEntry {
    pub amount: BaseUnits,
    /// Unix seconds.
    pub timestamp: i64,
}

/// A revenue payment normalized for display and aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueRecord {
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}
