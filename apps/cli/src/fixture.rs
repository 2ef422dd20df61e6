//! In-memory collaborators backed by a JSON fixture file.
//!
//! One [`FixtureStore`] plays every collaborator role: asset directory,
//! escrow contract, revenue ledger, withdrawal tracker and submitter.
//! Submitting a withdrawal marks it in flight until the process exits.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;

use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use asset_manager_core::errors::{Error, Result};
use asset_manager_core::revenue::RawRevenueEntry;
use asset_manager_core::units::BaseUnits;
use asset_manager_core::withdrawals::{
    WithdrawalKind, WithdrawalSubmitterTrait, WithdrawalTrackerTrait,
};
use asset_manager_core::{AssetDirectoryTrait, AssetRecord, EscrowSourceTrait, LedgerSourceTrait};

/// Manager income counters for one asset, in base units.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerIncome {
    #[serde(default)]
    pub earned: BaseUnits,
    #[serde(default)]
    pub withdrawn: BaseUnits,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InFlightWithdrawals {
    #[serde(default)]
    pub collateral: HashSet<String>,
    #[serde(default)]
    pub asset_manager_profit: HashSet<String>,
}

/// On-disk fixture layout. Maps are keyed by asset id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub assets: Vec<AssetRecord>,
    #[serde(default)]
    pub escrow: HashMap<String, BaseUnits>,
    #[serde(default)]
    pub revenue: HashMap<String, Vec<RawRevenueEntry>>,
    #[serde(default)]
    pub manager_income: HashMap<String, ManagerIncome>,
    #[serde(default)]
    pub in_flight: InFlightWithdrawals,
}

impl Fixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))
    }
}

pub struct FixtureStore {
    assets: Vec<AssetRecord>,
    escrow: HashMap<String, BaseUnits>,
    revenue: HashMap<String, Vec<RawRevenueEntry>>,
    manager_income: HashMap<String, ManagerIncome>,
    in_flight: RwLock<InFlightWithdrawals>,
}

impl FixtureStore {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            assets: fixture.assets,
            escrow: fixture.escrow,
            revenue: fixture.revenue,
            manager_income: fixture.manager_income,
            in_flight: RwLock::new(fixture.in_flight),
        }
    }

    pub fn first_asset(&self) -> Option<&AssetRecord> {
        self.assets.first()
    }

    pub fn asset(&self, asset_id: &str) -> Option<&AssetRecord> {
        self.assets.iter().find(|a| a.asset_id == asset_id)
    }

    fn income_for(&self, manager: &str, asset_id: &str) -> Result<&ManagerIncome> {
        let asset = self
            .asset(asset_id)
            .ok_or_else(|| Error::Collaborator(format!("Unknown asset {}", asset_id)))?;
        if !asset.is_managed_by(manager) {
            return Err(Error::Collaborator(format!(
                "{} is not the manager of {}",
                manager, asset_id
            )));
        }
        self.manager_income
            .get(asset_id)
            .ok_or_else(|| Error::Collaborator(format!("No income ledger for {}", asset_id)))
    }

    fn mark_in_flight(&self, kind: WithdrawalKind, asset_id: &str) -> Result<()> {
        let mut in_flight = self
            .in_flight
            .write()
            .map_err(|_| Error::Unexpected("In-flight withdrawal set poisoned".to_string()))?;
        let set = match kind {
            WithdrawalKind::Collateral => &mut in_flight.collateral,
            WithdrawalKind::AssetManagerProfit => &mut in_flight.asset_manager_profit,
        };
        if !set.insert(asset_id.to_string()) {
            return Err(Error::Submission(format!(
                "A {} withdrawal is already in flight for {}",
                kind.as_str(),
                asset_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AssetDirectoryTrait for FixtureStore {
    async fn find_asset(&self, asset_id: &str) -> Result<Option<AssetRecord>> {
        Ok(self.asset(asset_id).cloned())
    }
}

#[async_trait]
impl EscrowSourceTrait for FixtureStore {
    async fn get_remaining_escrow(&self, asset_id: &str) -> Result<BaseUnits> {
        self.escrow
            .get(asset_id)
            .copied()
            .ok_or_else(|| Error::Collaborator(format!("No escrow balance for {}", asset_id)))
    }
}

#[async_trait]
impl LedgerSourceTrait for FixtureStore {
    async fn get_revenue_log(&self, asset_id: &str) -> Result<Vec<RawRevenueEntry>> {
        Ok(self.revenue.get(asset_id).cloned().unwrap_or_default())
    }

    async fn get_manager_income_earned(&self, manager: &str, asset_id: &str) -> Result<BaseUnits> {
        Ok(self.income_for(manager, asset_id)?.earned)
    }

    async fn get_manager_income_withdrawn(
        &self,
        manager: &str,
        asset_id: &str,
    ) -> Result<BaseUnits> {
        Ok(self.income_for(manager, asset_id)?.withdrawn)
    }
}

impl WithdrawalTrackerTrait for FixtureStore {
    fn list_in_flight_withdrawals(&self, kind: WithdrawalKind) -> HashSet<String> {
        let in_flight = self
            .in_flight
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match kind {
            WithdrawalKind::Collateral => in_flight.collateral.clone(),
            WithdrawalKind::AssetManagerProfit => in_flight.asset_manager_profit.clone(),
        }
    }
}

#[async_trait]
impl WithdrawalSubmitterTrait for FixtureStore {
    async fn withdraw_collateral(
        &self,
        asset: &AssetRecord,
        percentage: Decimal,
        amount: Decimal,
    ) -> Result<()> {
        self.mark_in_flight(WithdrawalKind::Collateral, &asset.asset_id)?;
        tracing::info!(
            asset_id = %asset.asset_id,
            %percentage,
            %amount,
            "Submitted collateral withdrawal"
        );
        Ok(())
    }

    async fn withdraw_profit_asset_manager(
        &self,
        asset: &AssetRecord,
        amount: Decimal,
    ) -> Result<()> {
        self.mark_in_flight(WithdrawalKind::AssetManagerProfit, &asset.asset_id)?;
        tracing::info!(
            asset_id = %asset.asset_id,
            %amount,
            "Submitted asset manager profit withdrawal"
        );
        Ok(())
    }
}
