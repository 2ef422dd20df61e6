//! Asset manager profit and withdrawable income.

mod profit_calculator;
mod profit_model;

pub use profit_calculator::{calculate_profit, withdrawable_income};
pub use profit_model::{ManagerWithdrawState, ProfitSummary};
