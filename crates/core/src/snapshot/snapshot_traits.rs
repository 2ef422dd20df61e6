use std::sync::Arc;

use async_trait::async_trait;

use super::snapshot_model::{AssetSnapshot, SnapshotOutcome, SnapshotState};

/// Trait defining the contract for the manage-asset snapshot coordinator.
#[async_trait]
pub trait SnapshotCoordinatorTrait: Send + Sync {
    /// Validates `caller` against the asset and, when eligible, computes a fresh snapshot.
    ///
    /// Returns [`SnapshotOutcome::Busy`] without side effects while a previous
    /// trigger is still running.
    async fn build_snapshot(&self, asset_id: &str, caller: &str) -> SnapshotOutcome;

    fn state(&self) -> SnapshotState;

    fn current_snapshot(&self) -> Option<Arc<AssetSnapshot>>;

    /// Discards the result of any running computation and resets to `Idle`.
    /// Call when the selected asset or the caller changes.
    fn invalidate(&self);

    fn is_in_flight(&self) -> bool;
}
