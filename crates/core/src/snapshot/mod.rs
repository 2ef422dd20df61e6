//! Snapshot module - eligibility checks, single-flight coordination, and the
//! immutable snapshot consumed by the manage-asset view.

mod snapshot_coordinator;
mod snapshot_model;
mod snapshot_traits;

pub use snapshot_coordinator::{check_eligibility, SnapshotCoordinator};
pub use snapshot_model::*;
pub use snapshot_traits::SnapshotCoordinatorTrait;

#[cfg(test)]
mod snapshot_coordinator_tests;
