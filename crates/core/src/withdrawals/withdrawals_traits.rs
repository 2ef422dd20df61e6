use std::collections::HashSet;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::withdrawals_model::WithdrawalKind;
use crate::assets::AssetRecord;
use crate::errors::Result;

/// Process-wide record of withdrawals that have been submitted but not yet settled.
pub trait WithdrawalTrackerTrait: Send + Sync {
    /// Asset ids with a withdrawal of `kind` currently in flight.
    fn list_in_flight_withdrawals(&self, kind: WithdrawalKind) -> HashSet<String>;
}

/// Submits withdrawal transactions on behalf of the asset manager.
#[async_trait]
pub trait WithdrawalSubmitterTrait: Send + Sync {
    async fn withdraw_collateral(
        &self,
        asset: &AssetRecord,
        percentage: Decimal,
        amount: Decimal,
    ) -> Result<()>;

    async fn withdraw_profit_asset_manager(
        &self,
        asset: &AssetRecord,
        amount: Decimal,
    ) -> Result<()>;
}
