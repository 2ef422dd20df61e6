//! Withdrawals module - withdrawal kinds, in-flight tracking, submission,
//! and the action handles a snapshot exposes.

mod withdrawal_actions;
mod withdrawals_model;
mod withdrawals_traits;

pub use withdrawal_actions::{WithdrawCollateralAction, WithdrawProfitAction};
pub use withdrawals_model::WithdrawalKind;
pub use withdrawals_traits::{WithdrawalSubmitterTrait, WithdrawalTrackerTrait};
