use serde::{Deserialize, Serialize};

/// The two privileged withdrawals an asset manager can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalKind {
    Collateral,
    AssetManagerProfit,
}

impl WithdrawalKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            WithdrawalKind::Collateral => "COLLATERAL",
            WithdrawalKind::AssetManagerProfit => "ASSET_MANAGER_PROFIT",
        }
    }
}
