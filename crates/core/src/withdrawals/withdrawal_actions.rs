//! Action handles exposed on a ready snapshot.
//!
//! A handle fixes the arguments of a withdrawal at snapshot time; calling
//! `submit` forwards them to the submitter unchanged.

use std::fmt;
use std::sync::Arc;

use log::debug;
use rust_decimal::Decimal;
use serde::Serialize;

use super::withdrawals_traits::WithdrawalSubmitterTrait;
use crate::assets::AssetRecord;
use crate::errors::{CalculatorError, Result};

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawCollateralAction {
    #[serde(skip)]
    asset: AssetRecord,
    pub percentage_max: Option<Decimal>,
    pub withdraw_max: Option<Decimal>,
    #[serde(skip)]
    submitter: Arc<dyn WithdrawalSubmitterTrait>,
}

impl WithdrawCollateralAction {
    pub fn new(
        asset: AssetRecord,
        percentage_max: Option<Decimal>,
        withdraw_max: Option<Decimal>,
        submitter: Arc<dyn WithdrawalSubmitterTrait>,
    ) -> Self {
        Self {
            asset,
            percentage_max,
            withdraw_max,
            submitter,
        }
    }

    pub fn asset_id(&self) -> &str {
        &self.asset.asset_id
    }

    /// Submits the collateral withdrawal. Fails without contacting the
    /// submitter when no tranche was withdrawable at snapshot time.
    pub async fn submit(&self) -> Result<()> {
        let (percentage, amount) = match (self.percentage_max, self.withdraw_max) {
            (Some(percentage), Some(amount)) => (percentage, amount),
            _ => return Err(CalculatorError::NothingToWithdraw(self.asset.asset_id.clone()).into()),
        };
        debug!(
            "Submitting collateral withdrawal for {}: {}% ({})",
            self.asset.asset_id, percentage, amount
        );
        self.submitter
            .withdraw_collateral(&self.asset, percentage, amount)
            .await
    }
}

impl fmt::Debug for WithdrawCollateralAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithdrawCollateralAction")
            .field("asset_id", &self.asset.asset_id)
            .field("percentage_max", &self.percentage_max)
            .field("withdraw_max", &self.withdraw_max)
            .finish()
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawProfitAction {
    #[serde(skip)]
    asset: AssetRecord,
    pub to_withdraw: Decimal,
    #[serde(skip)]
    submitter: Arc<dyn WithdrawalSubmitterTrait>,
}

impl WithdrawProfitAction {
    pub fn new(
        asset: AssetRecord,
        to_withdraw: Decimal,
        submitter: Arc<dyn WithdrawalSubmitterTrait>,
    ) -> Self {
        Self {
            asset,
            to_withdraw,
            submitter,
        }
    }

    pub fn asset_id(&self) -> &str {
        &self.asset.asset_id
    }

    pub async fn submit(&self) -> Result<()> {
        debug!(
            "Submitting profit withdrawal for {}: {}",
            self.asset.asset_id, self.to_withdraw
        );
        self.submitter
            .withdraw_profit_asset_manager(&self.asset, self.to_withdraw)
            .await
    }
}

impl fmt::Debug for WithdrawProfitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithdrawProfitAction")
            .field("asset_id", &self.asset.asset_id)
            .field("to_withdraw", &self.to_withdraw)
            .finish()
    }
}
