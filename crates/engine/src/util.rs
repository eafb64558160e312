//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every write path enforces the same invariants before
//! touching the database.

use std::collections::HashSet;

use sea_orm::{ConnectionTrait, DatabaseTransaction, Statement};
use uuid::Uuid;

use crate::{AllocationSpec, EngineError, Money, ResultEngine, SplitSpec};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Run a `SELECT COALESCE(SUM(..), 0) AS sum` statement.
///
/// Only a missing row reads as zero; a column that does not decode is a
/// database error.
pub(crate) async fn query_sum(db: &DatabaseTransaction, stmt: Statement) -> ResultEngine<Money> {
    let row = db.query_one(stmt).await?;
    let sum = row
        .map(|r| r.try_get::<i64>("", "sum"))
        .transpose()?
        .unwrap_or(0);
    Ok(Money::new(sum))
}

/// Check that `splits` fully and exactly fund `original_amount`.
pub(crate) fn validate_splits(original_amount: Money, splits: &[SplitSpec]) -> ResultEngine<()> {
    if !original_amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "loan amount must be > 0".to_string(),
        ));
    }
    if splits.is_empty() {
        return Err(EngineError::InvalidSplit(
            "at least one split is required".to_string(),
        ));
    }

    let mut banks = HashSet::with_capacity(splits.len());
    for split in splits {
        if !split.amount.is_positive() {
            return Err(EngineError::InvalidSplit(format!(
                "split for bank {} must be > 0",
                split.bank_id
            )));
        }
        if !banks.insert(split.bank_id) {
            return Err(EngineError::InvalidSplit(format!(
                "bank {} appears more than once",
                split.bank_id
            )));
        }
    }

    let total = Money::checked_sum(splits.iter().map(|split| split.amount))
        .map_err(|_| EngineError::InvalidSplit("split total overflows".to_string()))?;
    if total != original_amount {
        return Err(EngineError::InvalidSplit(format!(
            "splits sum to {total}, expected {original_amount}"
        )));
    }
    Ok(())
}

/// Check the shape of a payment before any split is read.
pub(crate) fn validate_allocations(
    total_amount: Money,
    allocations: &[AllocationSpec],
) -> ResultEngine<()> {
    if !total_amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "payment amount must be > 0".to_string(),
        ));
    }
    if allocations.is_empty() {
        return Err(EngineError::InvalidAmount(
            "payment needs at least one allocation".to_string(),
        ));
    }

    let mut splits = HashSet::with_capacity(allocations.len());
    for allocation in allocations {
        if allocation.principal_paid.is_negative() || allocation.interest_paid.is_negative() {
            return Err(EngineError::InvalidAmount(format!(
                "allocation to split {} must not be negative",
                allocation.split_id
            )));
        }
        if allocation.principal_paid.is_zero() && allocation.interest_paid.is_zero() {
            return Err(EngineError::InvalidAmount(format!(
                "allocation to split {} is empty",
                allocation.split_id
            )));
        }
        if !splits.insert(allocation.split_id) {
            return Err(EngineError::InvalidAmount(format!(
                "split {} allocated more than once",
                allocation.split_id
            )));
        }
    }

    let allocated = Money::checked_sum(
        allocations
            .iter()
            .flat_map(|a| [a.principal_paid, a.interest_paid]),
    )?;
    if allocated != total_amount {
        return Err(EngineError::AmountMismatch(format!(
            "allocations sum to {allocated}, payment is {total_amount}"
        )));
    }
    Ok(())
}

/// Trim free text and drop it when empty.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}
