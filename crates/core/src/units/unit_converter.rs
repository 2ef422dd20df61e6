use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::{BASE_UNIT_DECIMALS, DISPLAY_DECIMAL_PRECISION};
use crate::errors::{Result, ValidationError};
use crate::units::BaseUnits;

/// Largest scale a `Decimal` can carry.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Converts ledger base-unit integers to decimal amounts and back.
///
/// All conversions are exact. Arithmetic that must not lose precision
/// (e.g. earned minus withdrawn) is done on `BaseUnits` first and converted
/// afterwards. Rounding happens only in [`UnitConverter::round_for_display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConverter {
    decimals: u32,
}

impl Default for UnitConverter {
    fn default() -> Self {
        UnitConverter {
            decimals: BASE_UNIT_DECIMALS,
        }
    }
}

impl UnitConverter {
    /// Creates a converter for a ledger token with `decimals` fractional digits.
    pub fn new(decimals: u32) -> Result<Self> {
        if decimals > MAX_DECIMAL_SCALE {
            return Err(ValidationError::InvalidInput(format!(
                "Token decimals {} exceed the supported maximum of {}",
                decimals, MAX_DECIMAL_SCALE
            ))
            .into());
        }
        Ok(UnitConverter { decimals })
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Converts a base-unit integer into its decimal amount.
    pub fn to_decimal(&self, amount: BaseUnits) -> Result<Decimal> {
        let raw = i128::try_from(amount.value()).map_err(|_| {
            ValidationError::InvalidInput(format!("Base-unit amount {} is out of range", amount))
        })?;
        let value = Decimal::try_from_i128_with_scale(raw, self.decimals)?;
        Ok(value.normalize())
    }

    /// Converts a decimal amount into base units.
    ///
    /// Fails for negative amounts and for amounts carrying more fractional
    /// digits than the ledger can represent. Nothing is rounded.
    pub fn to_base_units(&self, amount: Decimal) -> Result<BaseUnits> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationError::InvalidInput(format!(
                "Cannot convert negative amount {} to base units",
                amount
            ))
            .into());
        }

        let normalized = amount.normalize();
        let scale = normalized.scale();
        if scale > self.decimals {
            return Err(ValidationError::InvalidInput(format!(
                "Amount {} has more than {} fractional digits",
                amount, self.decimals
            ))
            .into());
        }

        let factor = 10i128.checked_pow(self.decimals - scale);
        let value = factor
            .and_then(|f| normalized.mantissa().checked_mul(f))
            .and_then(|v| u128::try_from(v).ok())
            .ok_or_else(|| {
                ValidationError::InvalidInput(format!(
                    "Amount {} overflows base-unit representation",
                    amount
                ))
            })?;

        Ok(BaseUnits(value))
    }

    /// Display rounding policy shared by every amount shown to users.
    pub fn round_for_display(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(
            DISPLAY_DECIMAL_PRECISION,
            RoundingStrategy::MidpointAwayFromZero,
        )
    }
}
