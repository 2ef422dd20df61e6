//! Asset Manager Core - collateral tranches, manager profit, and the
//! snapshot coordinator behind the manage-asset view.
//!
//! This crate is transport-agnostic. Asset registries, escrow contracts and
//! revenue ledgers are reached through the collaborator traits in
//! [`assets`] and [`withdrawals`], implemented by the embedding application.

pub mod assets;
pub mod collateral;
pub mod constants;
pub mod errors;
pub mod profit;
pub mod revenue;
pub mod snapshot;
pub mod units;
pub mod withdrawals;

pub use assets::*;
pub use snapshot::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
