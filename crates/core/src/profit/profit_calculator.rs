use log::error;
use rust_decimal::Decimal;

use super::profit_model::{ManagerWithdrawState, ProfitSummary};
use crate::errors::{CalculatorError, Result, ValidationError};
use crate::units::UnitConverter;

/// Computes the manager's profit entitlement and what can be withdrawn now.
///
/// `manager_percentage` is the manager's share of income in percent (0-100).
/// Fails with [`CalculatorError::LedgerInconsistency`] when the ledger records
/// more withdrawals than earnings.
pub fn calculate_profit(
    converter: &UnitConverter,
    asset_income: Decimal,
    manager_percentage: Decimal,
    days_since_it_went_live: u32,
    withdraw_state: &ManagerWithdrawState,
) -> Result<ProfitSummary> {
    if manager_percentage < Decimal::ZERO || manager_percentage > Decimal::ONE_HUNDRED {
        return Err(ValidationError::InvalidInput(format!(
            "Manager percentage must be within 0-100, got {}",
            manager_percentage
        ))
        .into());
    }

    let profit = asset_income * (manager_percentage / Decimal::ONE_HUNDRED);

    let average_profit = if days_since_it_went_live == 0 {
        None
    } else {
        Some(profit / Decimal::from(days_since_it_went_live))
    };

    let to_withdraw = withdrawable_income(converter, withdraw_state)?;

    Ok(ProfitSummary {
        profit,
        average_profit,
        to_withdraw,
    })
}

/// Income earned minus income withdrawn, subtracted in base units and then converted.
pub fn withdrawable_income(
    converter: &UnitConverter,
    withdraw_state: &ManagerWithdrawState,
) -> Result<Decimal> {
    let earned = withdraw_state.total_income_earned;
    let withdrawn = withdraw_state.total_withdrawn;

    match earned.checked_sub(withdrawn) {
        Some(remaining) => converter.to_decimal(remaining),
        None => {
            error!(
                "Ledger inconsistency: manager withdrew {} but only earned {}",
                withdrawn, earned
            );
            Err(CalculatorError::LedgerInconsistency { earned, withdrawn }.into())
        }
    }
}
