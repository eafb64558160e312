//! The module contains the error the engine can throw.
//!
//! Validation errors carry a human readable message and are always raised
//! before anything is written. [`Database`] wraps persistence failures; the
//! surrounding transaction is rolled back when it surfaces.
//!
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Split amounts do not add up to the loan amount, or a split is malformed.
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    /// The application was already approved or rejected.
    #[error("Application not pending: {0}")]
    ApplicationNotPending(String),
    /// An allocation pays more principal than the split still owes.
    #[error("Over allocation: {0}")]
    OverAllocation(String),
    /// A payment total differs from the sum of its allocations.
    #[error("Amount mismatch: {0}")]
    AmountMismatch(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid loan state: {0}")]
    InvalidLoanState(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    /// Required free text (email, name, password, type code) is missing.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Password hash error: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidSplit(a), Self::InvalidSplit(b)) => a == b,
            (Self::ApplicationNotPending(a), Self::ApplicationNotPending(b)) => a == b,
            (Self::OverAllocation(a), Self::OverAllocation(b)) => a == b,
            (Self::AmountMismatch(a), Self::AmountMismatch(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidLoanState(a), Self::InvalidLoanState(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
