//! Manage-asset snapshot coordinator.
//!
//! Drives one trigger through `Validating -> Fetching -> Ready | Failed`
//! (or `Ineligible`). A single-flight guard owned by the coordinator drops
//! triggers that arrive while a computation is running, and request tokens
//! keep a computation invalidated mid-flight from publishing its result.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, warn};

use super::snapshot_model::{
    AssetSnapshot, IneligibleReason, SnapshotOutcome, SnapshotState, WithdrawalActions,
};
use super::snapshot_traits::SnapshotCoordinatorTrait;
use crate::assets::{
    AssetDirectoryTrait, AssetRecord, EscrowSourceTrait, EscrowState, LedgerSourceTrait,
};
use crate::collateral::calculate_collateral_schedule;
use crate::errors::{Error, Result};
use crate::profit::{calculate_profit, ManagerWithdrawState};
use crate::revenue::{map_revenue_entries, total_revenue};
use crate::units::UnitConverter;
use crate::withdrawals::{
    WithdrawCollateralAction, WithdrawProfitAction, WithdrawalKind, WithdrawalSubmitterTrait,
    WithdrawalTrackerTrait,
};

/// Checks whether `caller` may manage `asset`.
///
/// Ownership is checked before funding status, so a caller who is not the
/// asset manager always gets `NoPermission`.
pub fn check_eligibility(asset: &AssetRecord, caller: &str) -> Option<IneligibleReason> {
    if !asset.is_managed_by(caller) {
        Some(IneligibleReason::NoPermission)
    } else if !asset.funded && asset.past_date {
        Some(IneligibleReason::AssetFundingFailed)
    } else if !asset.funded {
        Some(IneligibleReason::AssetNotFunded)
    } else {
        None
    }
}

/// Holds the single-flight flag for the lifetime of one computation.
/// Dropping it releases the flag, including on early return.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlightGuard { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Coordinates collaborator fetches and calculators into [`AssetSnapshot`]s.
pub struct SnapshotCoordinator {
    asset_directory: Arc<dyn AssetDirectoryTrait>,
    escrow_source: Arc<dyn EscrowSourceTrait>,
    ledger_source: Arc<dyn LedgerSourceTrait>,
    withdrawal_tracker: Arc<dyn WithdrawalTrackerTrait>,
    withdrawal_submitter: Arc<dyn WithdrawalSubmitterTrait>,
    converter: UnitConverter,
    in_flight: AtomicBool,
    latest_token: AtomicU64,
    state: RwLock<SnapshotState>,
}

impl SnapshotCoordinator {
    /// Creates a new SnapshotCoordinator instance.
    pub fn new(
        asset_directory: Arc<dyn AssetDirectoryTrait>,
        escrow_source: Arc<dyn EscrowSourceTrait>,
        ledger_source: Arc<dyn LedgerSourceTrait>,
        withdrawal_tracker: Arc<dyn WithdrawalTrackerTrait>,
        withdrawal_submitter: Arc<dyn WithdrawalSubmitterTrait>,
        converter: UnitConverter,
    ) -> Self {
        Self {
            asset_directory,
            escrow_source,
            ledger_source,
            withdrawal_tracker,
            withdrawal_submitter,
            converter,
            in_flight: AtomicBool::new(false),
            latest_token: AtomicU64::new(0),
            state: RwLock::new(SnapshotState::Idle),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SnapshotState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SnapshotState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies `next` only if `token` is still the latest issued token.
    /// The token is compared under the state lock so `invalidate` cannot interleave.
    fn transition(&self, token: u64, next: SnapshotState) -> bool {
        let mut state = self.write_state();
        if self.latest_token.load(Ordering::SeqCst) != token {
            return false;
        }
        *state = next;
        true
    }

    fn is_current(&self, token: u64) -> bool {
        self.latest_token.load(Ordering::SeqCst) == token
    }

    /// Runs validation and computation for an already-guarded trigger.
    async fn run(&self, asset_id: &str, caller: &str, token: u64) -> SnapshotOutcome {
        if self.asset_directory.is_loading() {
            // The previous snapshot stays published until the directory is ready.
            debug!("Asset directory still loading; skipping snapshot for {}", asset_id);
            return SnapshotOutcome::DirectoryLoading;
        }

        self.transition(token, SnapshotState::Validating);

        let asset = match self.asset_directory.find_asset(asset_id).await {
            Ok(Some(asset)) => asset,
            Ok(None) => return self.ineligible(token, asset_id, IneligibleReason::NoAsset),
            Err(e) => return self.fail(token, asset_id, e),
        };

        if let Some(reason) = check_eligibility(&asset, caller) {
            return self.ineligible(token, asset_id, reason);
        }

        self.transition(token, SnapshotState::Fetching);

        match self.compute(asset, caller, token).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                if self.transition(token, SnapshotState::Ready(snapshot.clone())) {
                    debug!("Snapshot {} ready for asset {}", token, asset_id);
                    SnapshotOutcome::Ready(snapshot)
                } else {
                    debug!("Discarding superseded snapshot {} for asset {}", token, asset_id);
                    SnapshotOutcome::Superseded
                }
            }
            Err(e) => self.fail(token, asset_id, e),
        }
    }

    fn ineligible(&self, token: u64, asset_id: &str, reason: IneligibleReason) -> SnapshotOutcome {
        warn!("Asset {} is not manageable by caller: {:?}", asset_id, reason);
        if self.transition(token, SnapshotState::Ineligible(reason)) {
            SnapshotOutcome::Ineligible(reason)
        } else {
            SnapshotOutcome::Superseded
        }
    }

    fn fail(&self, token: u64, asset_id: &str, err: Error) -> SnapshotOutcome {
        if !self.is_current(token) {
            debug!(
                "Ignoring failure of superseded snapshot {} for asset {}: {}",
                token, asset_id, err
            );
            return SnapshotOutcome::Superseded;
        }
        error!("Failed to build snapshot for asset {}: {}", asset_id, err);
        let err = Arc::new(err);
        if self.transition(token, SnapshotState::Failed(err.clone())) {
            SnapshotOutcome::Failed(err)
        } else {
            SnapshotOutcome::Superseded
        }
    }

    async fn compute(&self, asset: AssetRecord, caller: &str, token: u64) -> Result<AssetSnapshot> {
        let asset_id = asset.asset_id.as_str();
        let manager = asset.asset_manager.as_str();

        let manager_income = async {
            futures::try_join!(
                self.ledger_source
                    .get_manager_income_earned(manager, asset_id),
                self.ledger_source
                    .get_manager_income_withdrawn(manager, asset_id),
            )
        };

        let (escrow_units, raw_revenue, (total_income_earned, total_withdrawn)) = futures::try_join!(
            self.escrow_source.get_remaining_escrow(asset_id),
            self.ledger_source.get_revenue_log(asset_id),
            manager_income,
        )?;

        let escrow = EscrowState::new(self.converter.to_decimal(escrow_units)?, asset.collateral)?;

        let schedule = calculate_collateral_schedule(
            asset.funding_goal,
            asset.collateral,
            asset.asset_income,
            escrow.remaining_escrow,
        )?;

        let manager_withdraw_state = ManagerWithdrawState {
            total_income_earned,
            total_withdrawn,
        };
        let profit = calculate_profit(
            &self.converter,
            asset.asset_income,
            asset.manager_percentage,
            asset.days_since_it_went_live,
            &manager_withdraw_state,
        )?;

        let revenue = map_revenue_entries(&self.converter, &raw_revenue)?;
        let revenue_total = total_revenue(&revenue);

        let is_withdrawing_collateral = self
            .withdrawal_tracker
            .list_in_flight_withdrawals(WithdrawalKind::Collateral)
            .contains(asset_id);
        let is_withdrawing_asset_manager = self
            .withdrawal_tracker
            .list_in_flight_withdrawals(WithdrawalKind::AssetManagerProfit)
            .contains(asset_id);

        let methods = WithdrawalActions {
            withdraw_collateral: (!is_withdrawing_collateral).then(|| {
                WithdrawCollateralAction::new(
                    asset.clone(),
                    schedule.percentage_max,
                    schedule.withdraw_max,
                    self.withdrawal_submitter.clone(),
                )
            }),
            withdraw_profit_asset_manager: (!is_withdrawing_asset_manager).then(|| {
                WithdrawProfitAction::new(
                    asset.clone(),
                    profit.to_withdraw,
                    self.withdrawal_submitter.clone(),
                )
            }),
        };

        Ok(AssetSnapshot {
            request_token: token,
            user_address: caller.to_string(),
            escrow,
            manager_withdraw_state,
            revenue,
            total_revenue: revenue_total,
            tranches: schedule.tranches,
            percentage_withdrawn: schedule.percentage_withdrawn,
            withdraw_max: schedule.withdraw_max,
            percentage_max: schedule.percentage_max,
            profit: profit.profit,
            average_profit: profit.average_profit,
            to_withdraw: profit.to_withdraw,
            is_withdrawing_collateral,
            is_withdrawing_asset_manager,
            methods,
            calculated_at: Utc::now(),
            asset,
        })
    }
}

#[async_trait]
impl SnapshotCoordinatorTrait for SnapshotCoordinator {
    async fn build_snapshot(&self, asset_id: &str, caller: &str) -> SnapshotOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!(
                "Snapshot already in flight; dropping trigger for asset {}",
                asset_id
            );
            return SnapshotOutcome::Busy;
        };

        let token = {
            // Issued under the state lock so it orders with `invalidate`.
            let _state = self.write_state();
            self.latest_token.fetch_add(1, Ordering::SeqCst) + 1
        };
        debug!("Snapshot {} started for asset {}", token, asset_id);

        self.run(asset_id, caller, token).await
    }

    fn state(&self) -> SnapshotState {
        self.read_state().clone()
    }

    fn current_snapshot(&self) -> Option<Arc<AssetSnapshot>> {
        match &*self.read_state() {
            SnapshotState::Ready(snapshot) => Some(snapshot.clone()),
            _ => None,
        }
    }

    fn invalidate(&self) {
        let mut state = self.write_state();
        self.latest_token.fetch_add(1, Ordering::SeqCst);
        *state = SnapshotState::Idle;
    }

    fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}
