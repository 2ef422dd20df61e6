//! Core error types for the asset manager engine.
//!
//! Collaborator-specific errors (chain RPC, HTTP, registry clients) are
//! converted to these types by whoever implements the collaborator traits.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::units::BaseUnits;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A collaborator fetch (escrow, ledger, asset directory) failed.
    #[error("Collaborator request failed: {0}")]
    Collaborator(String),

    #[error("Withdrawal submission failed: {0}")]
    Submission(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Errors raised by the collateral and profit calculators.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CalculatorError {
    #[error("Funding goal must be greater than zero, got {0}")]
    InvalidFundingGoal(Decimal),

    #[error("Remaining escrow {remaining_escrow} exceeds posted collateral {collateral}")]
    EscrowExceedsCollateral {
        remaining_escrow: Decimal,
        collateral: Decimal,
    },

    /// Recorded withdrawals exceed recorded earnings. Signals an upstream
    /// ledger defect and is never clamped.
    #[error("Ledger inconsistency: withdrawn {withdrawn} exceeds earned {earned}")]
    LedgerInconsistency {
        earned: BaseUnits,
        withdrawn: BaseUnits,
    },

    #[error("No collateral tranche is currently withdrawable for asset {0}")]
    NothingToWithdraw(String),

    /// An intermediate value left the range a `Decimal` can represent.
    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),
}

/// Validation errors for caller input and collaborator payloads.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Decimal conversion failed: {0}")]
    Decimal(#[from] rust_decimal::Error),
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::Decimal(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
