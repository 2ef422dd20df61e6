//! Asset domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{CalculatorError, Result};

/// Off-chain metadata for a crowdfunded asset, as published by the asset registry.
///
/// Owned by the registry; the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub asset_id: String,
    /// Total collateral deposited by the asset manager.
    pub collateral: Decimal,
    pub funding_goal: Decimal,
    /// Cumulative income recognized for the asset.
    pub asset_income: Decimal,
    pub days_since_it_went_live: u32,
    pub asset_manager: String,
    /// Manager's share of income, 0-100.
    pub manager_percentage: Decimal,
    pub funded: bool,
    /// Funding deadline elapsed.
    pub past_date: bool,
}

impl AssetRecord {
    /// Whether `caller` is the asset manager. Identities are compared exactly.
    pub fn is_managed_by(&self, caller: &str) -> bool {
        self.asset_manager == caller
    }
}

/// Collateral still locked in escrow for an asset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EscrowState {
    pub remaining_escrow: Decimal,
}

impl EscrowState {
    /// Builds the escrow state, enforcing `0 <= remaining_escrow <= collateral`.
    pub fn new(remaining_escrow: Decimal, collateral: Decimal) -> Result<Self> {
        if remaining_escrow > collateral || remaining_escrow.is_sign_negative() {
            return Err(CalculatorError::EscrowExceedsCollateral {
                remaining_escrow,
                collateral,
            }
            .into());
        }
        Ok(EscrowState { remaining_escrow })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use rust_decimal_macros::dec;

    #[test]
    fn test_escrow_state_bounds() {
        assert!(EscrowState::new(dec!(750), dec!(1000)).is_ok());
        assert!(EscrowState::new(dec!(1000), dec!(1000)).is_ok());
        assert!(EscrowState::new(dec!(0), dec!(0)).is_ok());
        assert!(matches!(
            EscrowState::new(dec!(1001), dec!(1000)),
            Err(Error::Calculation(CalculatorError::EscrowExceedsCollateral { .. }))
        ));
    }

    #[test]
    fn test_asset_record_deserializes_camel_case() {
        let json = r#"{
            "assetId": "0xasset",
            "collateral": "1000",
            "fundingGoal": "1000",
            "assetIncome": "300",
            "daysSinceItWentLive": 30,
            "assetManager": "0xmanager",
            "managerPercentage": "5",
            "funded": true,
            "pastDate": false
        }"#;
        let record: AssetRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.funding_goal, dec!(1000));
        assert_eq!(record.days_since_it_went_live, 30);
        assert!(record.is_managed_by("0xmanager"));
        assert!(!record.is_managed_by("0xMANAGER"));
    }
}
