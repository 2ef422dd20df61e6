use async_trait::async_trait;

use super::assets_model::AssetRecord;
use crate::errors::Result;
use crate::revenue::RawRevenueEntry;
use crate::units::BaseUnits;

/// Registry of listed assets.
#[async_trait]
pub trait AssetDirectoryTrait: Send + Sync {
    /// Looks up an asset. `Ok(None)` means the asset does not exist.
    async fn find_asset(&self, asset_id: &str) -> Result<Option<AssetRecord>>;

    /// True while the directory is still populating its asset list.
    /// Lookups made during that window are meaningless.
    fn is_loading(&self) -> bool {
        false
    }
}

/// On-chain escrow holding the asset manager's collateral.
#[async_trait]
pub trait EscrowSourceTrait: Send + Sync {
    async fn get_remaining_escrow(&self, asset_id: &str) -> Result<BaseUnits>;
}

/// Revenue and manager income ledger for an asset.
#[async_trait]
pub trait LedgerSourceTrait: Send + Sync {
    async fn get_revenue_log(&self, asset_id: &str) -> Result<Vec<RawRevenueEntry>>;

    /// Cumulative income credited to the manager.
    async fn get_manager_income_earned(&self, manager: &str, asset_id: &str) -> Result<BaseUnits>;

    /// Cumulative income the manager has already withdrawn.
    async fn get_manager_income_withdrawn(
        &self,
        manager: &str,
        asset_id: &str,
    ) -> Result<BaseUnits>;
}
