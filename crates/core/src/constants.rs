/// Number of fractional digits in a ledger base-unit amount (wei convention)
pub const BASE_UNIT_DECIMALS: u32 = 18;

/// Number of collateral release tranches
pub const TRANCHE_COUNT: u8 = 4;

/// Share of the funding goal (and of the collateral) covered by one tranche, in percent
pub const TRANCHE_STEP_PERCENT: u32 = 25;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;
