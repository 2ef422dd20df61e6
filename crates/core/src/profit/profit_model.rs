use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::units::BaseUnits;

/// Manager income figures recorded on the ledger, in base units.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagerWithdrawState {
    pub total_income_earned: BaseUnits,
    pub total_withdrawn: BaseUnits,
}

/// Asset manager profit figures derived from asset income and the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSummary {
    /// Manager's share of the asset income.
    pub profit: Decimal,
    /// Profit per day live. `None` on the day the asset went live.
    pub average_profit: Option<Decimal>,
    /// Income earned but not yet withdrawn.
    pub to_withdraw: Decimal,
}
