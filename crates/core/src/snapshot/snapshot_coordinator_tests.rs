//! Unit tests for the snapshot coordinator.

use super::*;
use crate::assets::{AssetDirectoryTrait, AssetRecord, EscrowSourceTrait, LedgerSourceTrait};
use crate::errors::{CalculatorError, Error, Result};
use crate::revenue::RawRevenueEntry;
use crate::units::{BaseUnits, UnitConverter};
use crate::withdrawals::{WithdrawalKind, WithdrawalSubmitterTrait, WithdrawalTrackerTrait};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

const ONE_ETHER: u128 = 1_000_000_000_000_000_000;
const MANAGER: &str = "0xmanager";
const ASSET_ID: &str = "0xasset";

// ============================================================================
// Mock Implementations
// ============================================================================

struct MockAssetDirectory {
    assets: HashMap<String, AssetRecord>,
    loading: AtomicBool,
    calls: AtomicUsize,
}

impl MockAssetDirectory {
    fn new(assets: Vec<AssetRecord>) -> Self {
        Self {
            assets: assets.into_iter().map(|a| (a.asset_id.clone(), a)).collect(),
            loading: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetDirectoryTrait for MockAssetDirectory {
    async fn find_asset(&self, asset_id: &str) -> Result<Option<AssetRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.assets.get(asset_id).cloned())
    }

    fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}

/// Pauses the first escrow fetch until released, so tests can act mid-flight.
struct FetchGate {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

struct MockEscrowSource {
    remaining: BaseUnits,
    fail: AtomicBool,
    calls: AtomicUsize,
    gate: Mutex<Option<FetchGate>>,
}

impl MockEscrowSource {
    fn new(remaining: BaseUnits) -> Self {
        Self {
            remaining,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            gate: Mutex::new(None),
        }
    }

    fn gated(remaining: BaseUnits) -> (Self, Arc<Notify>, Arc<Notify>) {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let source = Self::new(remaining);
        *source.gate.lock().unwrap() = Some(FetchGate {
            started: started.clone(),
            release: release.clone(),
        });
        (source, started, release)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EscrowSourceTrait for MockEscrowSource {
    async fn get_remaining_escrow(&self, _asset_id: &str) -> Result<BaseUnits> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Collaborator("escrow RPC unavailable".to_string()));
        }
        Ok(self.remaining)
    }
}

struct MockLedgerSource {
    revenue: Vec<RawRevenueEntry>,
    earned: BaseUnits,
    withdrawn: BaseUnits,
    calls: AtomicUsize,
}

impl MockLedgerSource {
    fn new(earned: BaseUnits, withdrawn: BaseUnits) -> Self {
        Self {
            revenue: vec![
                RawRevenueEntry {
                    amount: BaseUnits(100 * ONE_ETHER),
                    timestamp: 1_546_300_800,
                },
                RawRevenueEntry {
                    amount: BaseUnits(200 * ONE_ETHER),
                    timestamp: 1_548_979_200,
                },
            ],
            earned,
            withdrawn,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerSourceTrait for MockLedgerSource {
    async fn get_revenue_log(&self, _asset_id: &str) -> Result<Vec<RawRevenueEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.revenue.clone())
    }

    async fn get_manager_income_earned(&self, manager: &str, _asset_id: &str) -> Result<BaseUnits> {
        assert_eq!(manager, MANAGER);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.earned)
    }

    async fn get_manager_income_withdrawn(
        &self,
        manager: &str,
        _asset_id: &str,
    ) -> Result<BaseUnits> {
        assert_eq!(manager, MANAGER);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.withdrawn)
    }
}

#[derive(Default)]
struct MockWithdrawalTracker {
    in_flight: HashMap<WithdrawalKind, HashSet<String>>,
}

impl MockWithdrawalTracker {
    fn with(kind: WithdrawalKind, asset_id: &str) -> Self {
        let mut tracker = Self::default();
        tracker
            .in_flight
            .entry(kind)
            .or_default()
            .insert(asset_id.to_string());
        tracker
    }
}

impl WithdrawalTrackerTrait for MockWithdrawalTracker {
    fn list_in_flight_withdrawals(&self, kind: WithdrawalKind) -> HashSet<String> {
        self.in_flight.get(&kind).cloned().unwrap_or_default()
    }
}

#[derive(Default)]
struct MockWithdrawalSubmitter {
    submitted: Mutex<Vec<String>>,
}

impl MockWithdrawalSubmitter {
    fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl WithdrawalSubmitterTrait for MockWithdrawalSubmitter {
    async fn withdraw_collateral(
        &self,
        asset: &AssetRecord,
        percentage: Decimal,
        amount: Decimal,
    ) -> Result<()> {
        self.submitted.lock().unwrap().push(format!(
            "collateral:{}:{}:{}",
            asset.asset_id,
            percentage.normalize(),
            amount.normalize()
        ));
        Ok(())
    }

    async fn withdraw_profit_asset_manager(
        &self,
        asset: &AssetRecord,
        amount: Decimal,
    ) -> Result<()> {
        self.submitted
            .lock()
            .unwrap()
            .push(format!("profit:{}:{}", asset.asset_id, amount.normalize()));
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn funded_asset() -> AssetRecord {
    AssetRecord {
        asset_id: ASSET_ID.to_string(),
        collateral: dec!(1000),
        funding_goal: dec!(1000),
        asset_income: dec!(300),
        days_since_it_went_live: 30,
        asset_manager: MANAGER.to_string(),
        manager_percentage: dec!(5),
        funded: true,
        past_date: false,
    }
}

struct Harness {
    directory: Arc<MockAssetDirectory>,
    escrow: Arc<MockEscrowSource>,
    ledger: Arc<MockLedgerSource>,
    submitter: Arc<MockWithdrawalSubmitter>,
    coordinator: SnapshotCoordinator,
}

fn harness_with(
    asset: AssetRecord,
    escrow: MockEscrowSource,
    ledger: MockLedgerSource,
    tracker: MockWithdrawalTracker,
) -> Harness {
    let directory = Arc::new(MockAssetDirectory::new(vec![asset]));
    let escrow = Arc::new(escrow);
    let ledger = Arc::new(ledger);
    let submitter = Arc::new(MockWithdrawalSubmitter::default());
    let coordinator = SnapshotCoordinator::new(
        directory.clone(),
        escrow.clone(),
        ledger.clone(),
        Arc::new(tracker),
        submitter.clone(),
        UnitConverter::default(),
    );
    Harness {
        directory,
        escrow,
        ledger,
        submitter,
        coordinator,
    }
}

fn harness(asset: AssetRecord) -> Harness {
    harness_with(
        asset,
        MockEscrowSource::new(BaseUnits(750 * ONE_ETHER)),
        MockLedgerSource::new(BaseUnits(15 * ONE_ETHER), BaseUnits(5 * ONE_ETHER)),
        MockWithdrawalTracker::default(),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_ready_snapshot_contents() {
    let h = harness(funded_asset());

    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;
    let snapshot = outcome.snapshot().expect("snapshot should be ready").clone();

    assert_eq!(snapshot.user_address, MANAGER);
    assert_eq!(snapshot.escrow.remaining_escrow, dec!(750));
    assert_eq!(snapshot.percentage_withdrawn, dec!(25));
    assert!(snapshot.tranches[0].paid_out);
    assert_eq!(snapshot.tranches[1].current, dec!(300));
    assert_eq!(snapshot.withdraw_max, None);
    assert_eq!(snapshot.percentage_max, None);
    assert_eq!(snapshot.profit, dec!(15));
    assert_eq!(snapshot.average_profit, Some(dec!(0.5)));
    assert_eq!(snapshot.to_withdraw, dec!(10));
    assert_eq!(snapshot.revenue.len(), 2);
    assert_eq!(snapshot.revenue[1].amount, dec!(200));
    assert_eq!(snapshot.total_revenue, dec!(300));
    assert!(!snapshot.is_withdrawing_collateral);
    assert!(!snapshot.is_withdrawing_asset_manager);
    assert!(snapshot.methods.withdraw_collateral.is_some());
    assert!(snapshot.methods.withdraw_profit_asset_manager.is_some());

    assert!(matches!(h.coordinator.state(), SnapshotState::Ready(_)));
    assert_eq!(
        h.coordinator.current_snapshot().unwrap().request_token,
        snapshot.request_token
    );
    assert!(!h.coordinator.is_in_flight());
    // revenue log + earned + withdrawn
    assert_eq!(h.ledger.calls(), 3);
    assert_eq!(h.escrow.calls(), 1);
}

#[tokio::test]
async fn test_unknown_asset_is_no_asset() {
    let h = harness(funded_asset());

    let outcome = h.coordinator.build_snapshot("0xmissing", MANAGER).await;

    assert_eq!(outcome.ineligible_reason(), Some(IneligibleReason::NoAsset));
    assert!(matches!(
        h.coordinator.state(),
        SnapshotState::Ineligible(IneligibleReason::NoAsset)
    ));
    assert_eq!(h.escrow.calls(), 0);
}

#[tokio::test]
async fn test_non_manager_gets_no_permission_regardless_of_funding() {
    for (funded, past_date) in [(true, false), (false, true), (false, false)] {
        let asset = AssetRecord {
            funded,
            past_date,
            ..funded_asset()
        };
        let h = harness(asset);

        let outcome = h.coordinator.build_snapshot(ASSET_ID, "0xstranger").await;

        assert_eq!(
            outcome.ineligible_reason(),
            Some(IneligibleReason::NoPermission)
        );
        assert_eq!(h.escrow.calls(), 0);
        assert_eq!(h.ledger.calls(), 0);
    }
}

#[tokio::test]
async fn test_funding_status_reasons() {
    let failed = harness(AssetRecord {
        funded: false,
        past_date: true,
        ..funded_asset()
    });
    assert_eq!(
        failed
            .coordinator
            .build_snapshot(ASSET_ID, MANAGER)
            .await
            .ineligible_reason(),
        Some(IneligibleReason::AssetFundingFailed)
    );

    let pending = harness(AssetRecord {
        funded: false,
        past_date: false,
        ..funded_asset()
    });
    assert_eq!(
        pending
            .coordinator
            .build_snapshot(ASSET_ID, MANAGER)
            .await
            .ineligible_reason(),
        Some(IneligibleReason::AssetNotFunded)
    );
}

#[test]
fn test_check_eligibility() {
    let asset = funded_asset();
    assert_eq!(check_eligibility(&asset, MANAGER), None);
    assert_eq!(
        check_eligibility(&asset, "0xother"),
        Some(IneligibleReason::NoPermission)
    );
    // A funded asset whose deadline passed is still manageable.
    let late = AssetRecord {
        past_date: true,
        ..funded_asset()
    };
    assert_eq!(check_eligibility(&late, MANAGER), None);
}

#[tokio::test]
async fn test_trigger_while_in_flight_is_dropped() {
    let (escrow, started, release) = MockEscrowSource::gated(BaseUnits(750 * ONE_ETHER));
    let h = harness_with(
        funded_asset(),
        escrow,
        MockLedgerSource::new(BaseUnits(15 * ONE_ETHER), BaseUnits(5 * ONE_ETHER)),
        MockWithdrawalTracker::default(),
    );

    let first = h.coordinator.build_snapshot(ASSET_ID, MANAGER);
    let second = async {
        started.notified().await;
        assert!(h.coordinator.is_in_flight());
        assert!(matches!(h.coordinator.state(), SnapshotState::Fetching));

        let directory_calls = h.directory.calls();
        let escrow_calls = h.escrow.calls();
        let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;

        // The dropped trigger touched no collaborator.
        assert_eq!(h.directory.calls(), directory_calls);
        assert_eq!(h.escrow.calls(), escrow_calls);

        release.notify_one();
        outcome
    };

    let (first, second) = tokio::join!(first, second);

    assert!(matches!(second, SnapshotOutcome::Busy));
    assert!(first.snapshot().is_some());
    assert!(!h.coordinator.is_in_flight());

    // Once the guard clears a new trigger runs normally.
    let third = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;
    let third = third.snapshot().expect("third trigger should succeed");
    assert!(third.request_token > first.snapshot().unwrap().request_token);
    assert_eq!(h.directory.calls(), 2);
    assert_eq!(h.escrow.calls(), 2);
}

#[tokio::test]
async fn test_invalidate_discards_in_flight_result() {
    let (escrow, started, release) = MockEscrowSource::gated(BaseUnits(750 * ONE_ETHER));
    let h = harness_with(
        funded_asset(),
        escrow,
        MockLedgerSource::new(BaseUnits(15 * ONE_ETHER), BaseUnits(5 * ONE_ETHER)),
        MockWithdrawalTracker::default(),
    );

    let first = h.coordinator.build_snapshot(ASSET_ID, MANAGER);
    let interrupt = async {
        started.notified().await;
        h.coordinator.invalidate();
        release.notify_one();
    };

    let (outcome, _) = tokio::join!(first, interrupt);

    assert!(matches!(outcome, SnapshotOutcome::Superseded));
    assert!(matches!(h.coordinator.state(), SnapshotState::Idle));
    assert!(h.coordinator.current_snapshot().is_none());
    assert!(!h.coordinator.is_in_flight());
}

#[tokio::test]
async fn test_fetch_failure_is_terminal_and_releases_guard() {
    let h = harness(funded_asset());
    h.escrow.fail.store(true, Ordering::SeqCst);

    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;

    assert!(matches!(outcome.error(), Some(Error::Collaborator(_))));
    match h.coordinator.state() {
        SnapshotState::Failed(err) => assert!(matches!(*err, Error::Collaborator(_))),
        other => panic!("expected failed state, got {:?}", other),
    }
    assert!(!h.coordinator.is_in_flight());

    h.escrow.fail.store(false, Ordering::SeqCst);
    let retry = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;
    assert!(retry.snapshot().is_some());
}

#[tokio::test]
async fn test_ledger_inconsistency_fails_snapshot() {
    let h = harness_with(
        funded_asset(),
        MockEscrowSource::new(BaseUnits(750 * ONE_ETHER)),
        MockLedgerSource::new(BaseUnits(5 * ONE_ETHER), BaseUnits(6 * ONE_ETHER)),
        MockWithdrawalTracker::default(),
    );

    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;

    assert!(matches!(
        outcome.error(),
        Some(Error::Calculation(CalculatorError::LedgerInconsistency { .. }))
    ));
}

#[tokio::test]
async fn test_escrow_above_collateral_fails_snapshot() {
    let h = harness_with(
        funded_asset(),
        MockEscrowSource::new(BaseUnits(1001 * ONE_ETHER)),
        MockLedgerSource::new(BaseUnits(15 * ONE_ETHER), BaseUnits(5 * ONE_ETHER)),
        MockWithdrawalTracker::default(),
    );

    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;

    assert!(matches!(
        outcome.error(),
        Some(Error::Calculation(
            CalculatorError::EscrowExceedsCollateral { .. }
        ))
    ));
}

#[tokio::test]
async fn test_in_flight_withdrawals_hide_actions() {
    let h = harness_with(
        funded_asset(),
        MockEscrowSource::new(BaseUnits(750 * ONE_ETHER)),
        MockLedgerSource::new(BaseUnits(15 * ONE_ETHER), BaseUnits(5 * ONE_ETHER)),
        MockWithdrawalTracker::with(WithdrawalKind::Collateral, ASSET_ID),
    );

    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;
    let snapshot = outcome.snapshot().unwrap();

    assert!(snapshot.is_withdrawing_collateral);
    assert!(!snapshot.is_withdrawing_asset_manager);
    assert!(snapshot.methods.withdraw_collateral.is_none());
    assert!(snapshot.methods.withdraw_profit_asset_manager.is_some());

    let h = harness_with(
        funded_asset(),
        MockEscrowSource::new(BaseUnits(750 * ONE_ETHER)),
        MockLedgerSource::new(BaseUnits(15 * ONE_ETHER), BaseUnits(5 * ONE_ETHER)),
        MockWithdrawalTracker::with(WithdrawalKind::AssetManagerProfit, ASSET_ID),
    );
    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;
    let snapshot = outcome.snapshot().unwrap();
    assert!(snapshot.methods.withdraw_collateral.is_some());
    assert!(snapshot.methods.withdraw_profit_asset_manager.is_none());
}

#[tokio::test]
async fn test_actions_submit_snapshot_arguments() {
    // Nothing released yet and income covers the first tranche.
    let h = harness_with(
        funded_asset(),
        MockEscrowSource::new(BaseUnits(1000 * ONE_ETHER)),
        MockLedgerSource::new(BaseUnits(15 * ONE_ETHER), BaseUnits(5 * ONE_ETHER)),
        MockWithdrawalTracker::default(),
    );

    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;
    let snapshot = outcome.snapshot().unwrap();

    let collateral = snapshot.methods.withdraw_collateral.as_ref().unwrap();
    assert_eq!(collateral.asset_id(), ASSET_ID);
    collateral.submit().await.unwrap();
    snapshot
        .methods
        .withdraw_profit_asset_manager
        .as_ref()
        .unwrap()
        .submit()
        .await
        .unwrap();

    assert_eq!(
        h.submitter.submitted(),
        vec![
            format!("collateral:{}:25:250", ASSET_ID),
            format!("profit:{}:10", ASSET_ID),
        ]
    );
}

#[tokio::test]
async fn test_collateral_action_without_claim_refuses_to_submit() {
    let h = harness(funded_asset());

    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;
    let snapshot = outcome.snapshot().unwrap();
    let action = snapshot.methods.withdraw_collateral.as_ref().unwrap();

    let result = action.submit().await;

    assert!(matches!(
        result,
        Err(Error::Calculation(CalculatorError::NothingToWithdraw(_)))
    ));
    assert!(h.submitter.submitted().is_empty());
}

#[tokio::test]
async fn test_directory_loading_skips_validation() {
    let h = harness(funded_asset());
    h.directory.loading.store(true, Ordering::SeqCst);

    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;

    assert!(matches!(outcome, SnapshotOutcome::DirectoryLoading));
    assert!(matches!(h.coordinator.state(), SnapshotState::Idle));
    assert_eq!(h.directory.calls(), 0);
    assert!(!h.coordinator.is_in_flight());
}

#[tokio::test]
async fn test_directory_loading_keeps_previous_snapshot() {
    let h = harness(funded_asset());
    let first = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;
    let first_token = first.snapshot().unwrap().request_token;

    h.directory.loading.store(true, Ordering::SeqCst);
    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;

    assert!(matches!(outcome, SnapshotOutcome::DirectoryLoading));
    assert!(matches!(h.coordinator.state(), SnapshotState::Ready(_)));
    assert_eq!(
        h.coordinator.current_snapshot().unwrap().request_token,
        first_token
    );
    assert_eq!(h.escrow.calls(), 1);
}

#[tokio::test]
async fn test_income_overflow_fails_snapshot() {
    let mut asset = funded_asset();
    asset.asset_income = dec!(1000000000000000000000000000);
    let h = harness(asset);

    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;

    assert!(matches!(
        outcome.error(),
        Some(Error::Calculation(CalculatorError::Overflow(_)))
    ));
    assert!(matches!(h.coordinator.state(), SnapshotState::Failed(_)));
    assert!(!h.coordinator.is_in_flight());
}

#[tokio::test]
async fn test_snapshot_serializes_for_view() {
    let h = harness(funded_asset());

    let outcome = h.coordinator.build_snapshot(ASSET_ID, MANAGER).await;
    let json = serde_json::to_value(outcome.snapshot().unwrap().as_ref()).unwrap();

    let percentage: Decimal = json["percentageWithdrawn"].as_str().unwrap().parse().unwrap();
    assert_eq!(percentage, dec!(25));
    assert_eq!(json["tranches"][0]["paidOut"], true);
    assert!(json["averageProfit"].is_string());
    assert!(json["methods"]["withdrawCollateral"].is_object());
    assert_eq!(json["managerWithdrawState"]["totalIncomeEarned"], "15000000000000000000");
}
