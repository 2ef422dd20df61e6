//! Collateral tranche release calculation.
//!
//! Collateral is released in four equal tranches. Tranche `i` becomes
//! eligible once the asset's income reaches `25% * i` of its funding goal;
//! it counts as paid out once escrow has released at least `25% * i` of
//! the collateral.

use log::debug;
use rust_decimal::Decimal;

use super::collateral_model::{CollateralSchedule, Tranche};
use crate::assets::EscrowState;
use crate::constants::{TRANCHE_COUNT, TRANCHE_STEP_PERCENT};
use crate::errors::{CalculatorError, Result, ValidationError};

/// Computes the tranche schedule and the currently withdrawable collateral.
///
/// # Arguments
///
/// * `funding_goal` - Must be greater than zero.
/// * `collateral` - Total collateral posted, non-negative.
/// * `asset_income` - Cumulative asset income, non-negative. May exceed the goal.
/// * `remaining_escrow` - Collateral still locked, within `[0, collateral]`.
///
pub fn calculate_collateral_schedule(
    funding_goal: Decimal,
    collateral: Decimal,
    asset_income: Decimal,
    remaining_escrow: Decimal,
) -> Result<CollateralSchedule> {
    if funding_goal <= Decimal::ZERO {
        return Err(CalculatorError::InvalidFundingGoal(funding_goal).into());
    }
    if collateral.is_sign_negative() && !collateral.is_zero() {
        return Err(ValidationError::InvalidInput(format!(
            "Collateral cannot be negative, got {}",
            collateral
        ))
        .into());
    }
    if asset_income.is_sign_negative() && !asset_income.is_zero() {
        return Err(ValidationError::InvalidInput(format!(
            "Asset income cannot be negative, got {}",
            asset_income
        ))
        .into());
    }
    EscrowState::new(remaining_escrow, collateral)?;

    let hundred = Decimal::ONE_HUNDRED;
    let step = Decimal::from(TRANCHE_STEP_PERCENT);

    // Exact equality also covers collateral == 0, where the ratio is undefined.
    let percentage_withdrawn = if remaining_escrow == collateral {
        Decimal::ZERO
    } else {
        let remaining_share = remaining_escrow
            .checked_mul(hundred)
            .and_then(|v| v.checked_div(collateral))
            .ok_or(CalculatorError::Overflow("percentage withdrawn"))?;
        hundred - remaining_share
    };

    let income_ratio = asset_income
        .checked_mul(hundred)
        .and_then(|v| v.checked_div(funding_goal))
        .and_then(|v| v.checked_div(hundred))
        .ok_or(CalculatorError::Overflow("income ratio"))?;

    let tranches = (1..=TRANCHE_COUNT)
        .map(|index| -> Result<Tranche> {
            let position = Decimal::from(index);
            let threshold = step * position / hundred;
            let required = threshold
                .checked_mul(funding_goal)
                .ok_or(CalculatorError::Overflow("tranche threshold"))?;

            if income_ratio >= threshold {
                let withdrawable = step * position > percentage_withdrawn;
                return Ok(Tranche {
                    index,
                    required,
                    current: required,
                    withdrawable,
                    paid_out: !withdrawable,
                });
            }

            let lower = step * (position - Decimal::ONE) / hundred;
            // Lower bound inclusive: a ratio sitting exactly on a tranche
            // boundary shows as progress on the next tranche.
            let current = if income_ratio >= lower {
                income_ratio
                    .checked_mul(funding_goal)
                    .ok_or(CalculatorError::Overflow("tranche progress"))?
            } else {
                Decimal::ZERO
            };
            Ok(Tranche {
                index,
                required,
                current,
                withdrawable: false,
                paid_out: false,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let (withdraw_max, percentage_max) = max_withdrawable(&tranches, collateral, step);

    debug!(
        "Collateral schedule: {}% withdrawn, income ratio {}, withdrawable {:?} ({:?}%)",
        percentage_withdrawn, income_ratio, withdraw_max, percentage_max
    );

    Ok(CollateralSchedule {
        percentage_withdrawn,
        tranches,
        withdraw_max,
        percentage_max,
    })
}

/// Scans tranches in order, collapsing every eligible-but-unpaid tranche
/// into a single claim measured from the last paid-out tranche.
fn max_withdrawable(
    tranches: &[Tranche],
    collateral: Decimal,
    step: Decimal,
) -> (Option<Decimal>, Option<Decimal>) {
    let per_tranche = collateral / Decimal::from(TRANCHE_COUNT);
    let mut already_withdrawn: u8 = 0;
    let mut withdraw_max = None;
    let mut percentage_max = None;

    for tranche in tranches {
        if tranche.paid_out {
            already_withdrawn += 1;
        } else if tranche.withdrawable {
            let claimable = Decimal::from(tranche.index - already_withdrawn);
            withdraw_max = Some(per_tranche * claimable);
            percentage_max = Some(step * claimable);
        }
    }

    (withdraw_max, percentage_max)
}
