use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One of the four collateral release stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tranche {
    /// 1-based position in the release schedule.
    pub index: u8,
    /// Cumulative income threshold: `25% * index * funding_goal`.
    pub required: Decimal,
    /// Progress toward `required`.
    pub current: Decimal,
    pub withdrawable: bool,
    pub paid_out: bool,
}

/// Collateral release schedule for an asset at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollateralSchedule {
    /// Share of posted collateral already released from escrow, 0-100.
    pub percentage_withdrawn: Decimal,
    pub tranches: Vec<Tranche>,
    /// Amount the manager may withdraw right now. `None` when no tranche is withdrawable.
    pub withdraw_max: Option<Decimal>,
    /// `withdraw_max` expressed as a percentage of the collateral.
    pub percentage_max: Option<Decimal>,
}

impl CollateralSchedule {
    pub fn has_withdrawable(&self) -> bool {
        self.tranches.iter().any(|t| t.withdrawable)
    }

    pub fn paid_out_count(&self) -> usize {
        self.tranches.iter().filter(|t| t.paid_out).count()
    }
}
