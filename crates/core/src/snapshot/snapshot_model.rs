//! Snapshot domain models.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assets::{AssetRecord, EscrowState};
use crate::collateral::Tranche;
use crate::errors::Error;
use crate::profit::ManagerWithdrawState;
use crate::revenue::RevenueRecord;
use crate::withdrawals::{WithdrawCollateralAction, WithdrawProfitAction};

/// Why a caller cannot manage an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IneligibleReason {
    NoAsset,
    NoPermission,
    AssetFundingFailed,
    AssetNotFunded,
}

/// Withdrawal handles. Each is `None` while a withdrawal of that kind is in flight.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalActions {
    pub withdraw_collateral: Option<WithdrawCollateralAction>,
    pub withdraw_profit_asset_manager: Option<WithdrawProfitAction>,
}

/// Everything the manage-asset view needs, computed in one pass.
///
/// Never mutated after construction; a refresh produces a new snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSnapshot {
    /// Token of the trigger that produced this snapshot.
    pub request_token: u64,
    pub user_address: String,
    pub asset: AssetRecord,
    pub escrow: EscrowState,
    pub manager_withdraw_state: ManagerWithdrawState,
    pub revenue: Vec<RevenueRecord>,
    /// Sum of `revenue`.
    pub total_revenue: Decimal,
    pub tranches: Vec<Tranche>,
    pub percentage_withdrawn: Decimal,
    pub withdraw_max: Option<Decimal>,
    pub percentage_max: Option<Decimal>,
    pub profit: Decimal,
    pub average_profit: Option<Decimal>,
    pub to_withdraw: Decimal,
    pub is_withdrawing_collateral: bool,
    pub is_withdrawing_asset_manager: bool,
    pub methods: WithdrawalActions,
    pub calculated_at: DateTime<Utc>,
}

/// Coordinator state, observable between triggers.
#[derive(Debug, Clone, Default)]
pub enum SnapshotState {
    #[default]
    Idle,
    Validating,
    Fetching,
    Ineligible(IneligibleReason),
    Ready(Arc<AssetSnapshot>),
    Failed(Arc<Error>),
}

/// Result of one `build_snapshot` trigger.
#[derive(Debug, Clone)]
pub enum SnapshotOutcome {
    Ready(Arc<AssetSnapshot>),
    Ineligible(IneligibleReason),
    Failed(Arc<Error>),
    /// Another computation held the single-flight guard; nothing was done.
    Busy,
    /// The computation finished after `invalidate`; its result was discarded.
    Superseded,
    /// The asset directory is still loading; nothing was validated.
    DirectoryLoading,
}

impl SnapshotOutcome {
    pub fn snapshot(&self) -> Option<&Arc<AssetSnapshot>> {
        match self {
            SnapshotOutcome::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn ineligible_reason(&self) -> Option<IneligibleReason> {
        match self {
            SnapshotOutcome::Ineligible(reason) => Some(*reason),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            SnapshotOutcome::Failed(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
