//! Payment allocator.
//!
//! A payment is validated in full before anything is written, then the
//! payment row, its allocations and the split decrements commit together.
//! Each decrement is a conditional update that only matches while the split
//! still owes at least the allocated principal, so two concurrent payments
//! can never push a split below zero.

use std::collections::HashMap;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, Statement, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Allocation, AllocationSpec, EngineError, LoanSplit, LoanStatus, Money, Payment, PaymentCmd,
    Rate, ResultEngine, loan_payments, loans, payment_allocations,
    util::{normalize_optional_text, query_sum, validate_allocations},
};

use super::{Engine, with_tx};

impl Engine {
    /// Apply a payment to a loan.
    ///
    /// Fails with:
    /// - `AmountMismatch` when the allocations do not add up to the total,
    /// - `Forbidden` when `user_id` is not the borrower,
    /// - `KeyNotFound` when a split is not part of the loan,
    /// - `OverAllocation` when a split would go below zero principal.
    ///
    /// When the last principal is repaid the loan becomes `PAID`. A retry
    /// carrying an already used idempotency key returns the original payment.
    pub async fn make_payment(&self, cmd: PaymentCmd) -> ResultEngine<Payment> {
        validate_allocations(cmd.total_amount, &cmd.allocations)?;
        let paid_at = cmd.paid_at.unwrap_or_else(|| self.now());
        let comment = normalize_optional_text(cmd.comment.as_deref());
        let idempotency_key = normalize_optional_text(cmd.idempotency_key.as_deref());

        with_tx!(self, |db_tx| {
            let loan = self
                .require_owned_loan(&db_tx, cmd.loan_id, cmd.user_id)
                .await?;

            if let Some(key) = idempotency_key.as_deref() {
                let existing = loan_payments::Entity::find()
                    .filter(loan_payments::Column::LoanId.eq(loan.id))
                    .filter(loan_payments::Column::UserId.eq(cmd.user_id.to_string()))
                    .filter(loan_payments::Column::IdempotencyKey.eq(key.to_string()))
                    .one(&db_tx)
                    .await?;
                if let Some(existing) = existing {
                    tracing::debug!(payment_id = existing.id, key, "replayed payment");
                    return self.payment_with_allocations(&db_tx, existing).await;
                }
            }

            if LoanStatus::try_from(loan.status.as_str())? != LoanStatus::Active {
                return Err(EngineError::InvalidLoanState(format!(
                    "loan {} is {}",
                    loan.id, loan.status
                )));
            }

            let splits: HashMap<i64, LoanSplit> = self
                .loan_splits(&db_tx, loan.id)
                .await?
                .into_iter()
                .map(|split| (split.id, split))
                .collect();
            for allocation in &cmd.allocations {
                let split = splits.get(&allocation.split_id).ok_or_else(|| {
                    EngineError::KeyNotFound(format!(
                        "split {} on loan {}",
                        allocation.split_id, loan.id
                    ))
                })?;
                if allocation.principal_paid > split.remaining_principal {
                    return Err(EngineError::OverAllocation(format!(
                        "split {}: principal {} exceeds remaining {}",
                        split.id, allocation.principal_paid, split.remaining_principal
                    )));
                }
            }

            let payment_model = loan_payments::ActiveModel {
                id: ActiveValue::NotSet,
                loan_id: ActiveValue::Set(loan.id),
                user_id: ActiveValue::Set(cmd.user_id.to_string()),
                paid_at: ActiveValue::Set(paid_at),
                total_amount_minor: ActiveValue::Set(cmd.total_amount.minor()),
                comment: ActiveValue::Set(comment.clone()),
                idempotency_key: ActiveValue::Set(idempotency_key.clone()),
            }
            .insert(&db_tx)
            .await?;

            let mut allocations = Vec::with_capacity(cmd.allocations.len());
            for allocation in &cmd.allocations {
                let model = payment_allocations::ActiveModel {
                    id: ActiveValue::NotSet,
                    payment_id: ActiveValue::Set(payment_model.id),
                    split_id: ActiveValue::Set(allocation.split_id),
                    principal_paid_minor: ActiveValue::Set(allocation.principal_paid.minor()),
                    interest_paid_minor: ActiveValue::Set(allocation.interest_paid.minor()),
                }
                .insert(&db_tx)
                .await?;
                allocations.push(Allocation::from(model));

                if allocation.principal_paid.is_positive() {
                    self.decrement_split(&db_tx, loan.id, allocation.split_id, allocation.principal_paid)
                        .await?;
                }
            }

            let remaining = self.remaining_debt(&db_tx, loan.id).await?;
            if remaining.is_zero() {
                loans::Entity::update_many()
                    .col_expr(
                        loans::Column::Status,
                        Expr::value(LoanStatus::Paid.as_str()),
                    )
                    .filter(loans::Column::Id.eq(loan.id))
                    .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
                    .exec(&db_tx)
                    .await?;
                tracing::info!(loan_id = loan.id, "loan fully repaid");
            }

            tracing::info!(
                payment_id = payment_model.id,
                loan_id = loan.id,
                amount = %cmd.total_amount,
                remaining = %remaining,
                "payment applied"
            );
            Payment::try_from((payment_model, allocations))
        })
    }

    /// Propose allocations for paying `total_amount` on a loan.
    ///
    /// One month of interest on every split's remaining principal is covered
    /// first, at the loan rate. What is left repays principal in proportion
    /// to each split's remaining principal. The result can be passed straight
    /// to [`Engine::make_payment`].
    pub async fn plan_payment(
        &self,
        loan_id: i64,
        user_id: Uuid,
        total_amount: Money,
    ) -> ResultEngine<Vec<AllocationSpec>> {
        if !total_amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "payment amount must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let loan = self.require_owned_loan(&db_tx, loan_id, user_id).await?;
            if LoanStatus::try_from(loan.status.as_str())? != LoanStatus::Active {
                return Err(EngineError::InvalidLoanState(format!(
                    "loan {} is {}",
                    loan.id, loan.status
                )));
            }
            let rate = Rate::from_basis_points(loan.interest_rate_bps)?;
            let splits = self.loan_splits(&db_tx, loan.id).await?;
            plan_allocations(&splits, rate, total_amount)
        })
    }

    /// Payments on a loan, most recent first.
    pub async fn payments(&self, loan_id: i64, user_id: Uuid) -> ResultEngine<Vec<Payment>> {
        with_tx!(self, |db_tx| {
            self.require_owned_loan(&db_tx, loan_id, user_id).await?;
            self.loan_payments(&db_tx, loan_id).await
        })
    }

    /// Allocations of one payment, visible to the borrower only.
    pub async fn payment_allocations(
        &self,
        payment_id: i64,
        user_id: Uuid,
    ) -> ResultEngine<Vec<Allocation>> {
        with_tx!(self, |db_tx| {
            let payment = loan_payments::Entity::find_by_id(payment_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("payment {payment_id}")))?;
            self.require_owned_loan(&db_tx, payment.loan_id, user_id)
                .await?;
            Ok(self.payment_with_allocations(&db_tx, payment).await?.allocations)
        })
    }

    pub(super) async fn loan_payments(
        &self,
        db: &DatabaseTransaction,
        loan_id: i64,
    ) -> ResultEngine<Vec<Payment>> {
        let payment_models = loan_payments::Entity::find()
            .filter(loan_payments::Column::LoanId.eq(loan_id))
            .order_by_desc(loan_payments::Column::PaidAt)
            .order_by_desc(loan_payments::Column::Id)
            .all(db)
            .await?;
        if payment_models.is_empty() {
            return Ok(Vec::new());
        }

        let payment_ids: Vec<i64> = payment_models.iter().map(|p| p.id).collect();
        let mut by_payment: HashMap<i64, Vec<Allocation>> = HashMap::new();
        for model in payment_allocations::Entity::find()
            .filter(payment_allocations::Column::PaymentId.is_in(payment_ids))
            .order_by_asc(payment_allocations::Column::Id)
            .all(db)
            .await?
        {
            by_payment
                .entry(model.payment_id)
                .or_default()
                .push(Allocation::from(model));
        }

        payment_models
            .into_iter()
            .map(|model| {
                let allocations = by_payment.remove(&model.id).unwrap_or_default();
                Payment::try_from((model, allocations))
            })
            .collect()
    }

    async fn payment_with_allocations(
        &self,
        db: &DatabaseTransaction,
        model: loan_payments::Model,
    ) -> ResultEngine<Payment> {
        let allocations = payment_allocations::Entity::find()
            .filter(payment_allocations::Column::PaymentId.eq(model.id))
            .order_by_asc(payment_allocations::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(Allocation::from)
            .collect();
        Payment::try_from((model, allocations))
    }

    /// Lower a split's remaining principal, failing if it would go negative.
    async fn decrement_split(
        &self,
        db: &DatabaseTransaction,
        loan_id: i64,
        split_id: i64,
        principal: Money,
    ) -> ResultEngine<()> {
        let stmt = Statement::from_sql_and_values(
            db.get_database_backend(),
            "UPDATE loan_splits \
             SET remaining_principal_minor = remaining_principal_minor - ? \
             WHERE id = ? AND loan_id = ? AND remaining_principal_minor >= ?",
            vec![
                principal.minor().into(),
                split_id.into(),
                loan_id.into(),
                principal.minor().into(),
            ],
        );
        let result = db.execute(stmt).await?;
        if result.rows_affected() != 1 {
            return Err(EngineError::OverAllocation(format!(
                "split {split_id}: principal {principal} exceeds remaining"
            )));
        }
        Ok(())
    }

    pub(super) async fn remaining_debt(
        &self,
        db: &DatabaseTransaction,
        loan_id: i64,
    ) -> ResultEngine<Money> {
        let stmt = Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT COALESCE(SUM(remaining_principal_minor), 0) AS sum \
             FROM loan_splits WHERE loan_id = ?",
            vec![loan_id.into()],
        );
        query_sum(db, stmt).await
    }
}

/// Interest first, then principal pro rata to remaining principal.
fn plan_allocations(
    splits: &[LoanSplit],
    rate: Rate,
    total_amount: Money,
) -> ResultEngine<Vec<AllocationSpec>> {
    let interests = splits
        .iter()
        .map(|split| split.remaining_principal.monthly_interest(rate))
        .collect::<ResultEngine<Vec<_>>>()?;
    let remaining: Vec<Money> = splits.iter().map(|s| s.remaining_principal).collect();
    let total_interest = Money::checked_sum(interests.iter().copied())?;
    let total_remaining = Money::checked_sum(remaining.iter().copied())?;
    let payable = total_interest
        .checked_add(total_remaining)
        .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;

    if total_amount > payable {
        return Err(EngineError::OverAllocation(format!(
            "payment {total_amount} exceeds outstanding {payable}"
        )));
    }

    let (interest_parts, principal_parts) = if total_amount <= total_interest {
        (
            total_amount.distribute(&interests)?,
            vec![Money::ZERO; splits.len()],
        )
    } else {
        (interests, (total_amount - total_interest).distribute(&remaining)?)
    };

    Ok(splits
        .iter()
        .zip(interest_parts.into_iter().zip(principal_parts))
        .filter(|(_, (interest, principal))| !interest.is_zero() || !principal.is_zero())
        .map(|(split, (interest, principal))| AllocationSpec::new(split.id, principal, interest))
        .collect())
}
