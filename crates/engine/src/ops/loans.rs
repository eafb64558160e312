//! Loan & split manager.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Loan, LoanSplit, LoanStatus, Money, NewLoanCmd, Rate, ResultEngine, SplitSpec,
    loan_splits, loans,
    util::{normalize_optional_text, validate_splits},
};

use super::{Engine, LoanDetail, with_tx};

/// Fields of a loan about to be inserted.
pub(super) struct LoanDraft<'a> {
    pub user_id: Uuid,
    pub original_amount: Money,
    pub interest_rate: Rate,
    pub purpose: Option<String>,
    pub splits: &'a [SplitSpec],
    pub created_at: DateTime<Utc>,
}

impl Engine {
    /// Create a loan funded by the given splits.
    ///
    /// The split amounts must add up to `original_amount` exactly, every
    /// split must be positive and a bank may fund at most one split. The loan
    /// and all its splits are written in one transaction.
    pub async fn create_loan(&self, cmd: NewLoanCmd) -> ResultEngine<LoanDetail> {
        validate_splits(cmd.original_amount, &cmd.splits)?;
        let draft = LoanDraft {
            user_id: cmd.user_id,
            original_amount: cmd.original_amount,
            interest_rate: cmd.interest_rate,
            purpose: normalize_optional_text(cmd.purpose.as_deref()),
            splits: &cmd.splits,
            created_at: self.now(),
        };

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, draft.user_id).await?;
            let (loan, splits) = self.insert_loan(&db_tx, &draft).await?;
            tracing::info!(
                loan_id = loan.id,
                user_id = %loan.user_id,
                amount = %loan.original_amount,
                splits = splits.len(),
                "loan created"
            );
            Ok(LoanDetail::new(loan, splits, Vec::new()))
        })
    }

    /// Create a loan split as evenly as possible across `bank_ids`.
    ///
    /// Cents that cannot be divided evenly go to the first banks in the
    /// list, one each.
    pub async fn create_loan_evenly(
        &self,
        user_id: Uuid,
        original_amount: Money,
        interest_rate: Rate,
        purpose: Option<&str>,
        bank_ids: &[i16],
    ) -> ResultEngine<LoanDetail> {
        let parts = original_amount.split_evenly(bank_ids.len())?;
        let splits = bank_ids
            .iter()
            .zip(parts)
            .map(|(bank_id, amount)| SplitSpec::new(*bank_id, amount))
            .collect();
        let mut cmd = NewLoanCmd::new(user_id, original_amount, splits).interest_rate(interest_rate);
        cmd.purpose = purpose.map(ToString::to_string);
        self.create_loan(cmd).await
    }

    /// Loans of a user, most recent first.
    pub async fn user_loans(&self, user_id: Uuid) -> ResultEngine<Vec<Loan>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let models = loans::Entity::find()
                .filter(loans::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(loans::Column::TakenAt)
                .order_by_desc(loans::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Loan::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Administrative transition `ACTIVE -> DEFAULTED`.
    pub async fn mark_defaulted(&self, loan_id: i64) -> ResultEngine<Loan> {
        with_tx!(self, |db_tx| {
            self.require_loan(&db_tx, loan_id).await?;
            let updated = loans::Entity::update_many()
                .col_expr(
                    loans::Column::Status,
                    Expr::value(LoanStatus::Defaulted.as_str()),
                )
                .filter(loans::Column::Id.eq(loan_id))
                .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
                .exec(&db_tx)
                .await?;
            if updated.rows_affected != 1 {
                return Err(EngineError::InvalidLoanState(format!(
                    "loan {loan_id} is not active"
                )));
            }
            let loan = Loan::try_from(self.require_loan(&db_tx, loan_id).await?)?;
            tracing::warn!(loan_id, "loan marked as defaulted");
            Ok(loan)
        })
    }

    /// Insert a loan and its splits. Callers validate the splits and run this
    /// inside their transaction.
    pub(super) async fn insert_loan(
        &self,
        db: &DatabaseTransaction,
        draft: &LoanDraft<'_>,
    ) -> ResultEngine<(Loan, Vec<LoanSplit>)> {
        for split in draft.splits {
            self.require_bank(db, split.bank_id).await?;
        }

        let loan_model = loans::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(draft.user_id.to_string()),
            original_amount_minor: ActiveValue::Set(draft.original_amount.minor()),
            taken_at: ActiveValue::Set(draft.created_at),
            interest_rate_bps: ActiveValue::Set(draft.interest_rate.basis_points()),
            status: ActiveValue::Set(LoanStatus::Active.as_str().to_string()),
            purpose: ActiveValue::Set(draft.purpose.clone()),
            created_at: ActiveValue::Set(draft.created_at),
        }
        .insert(db)
        .await?;
        let loan_id = loan_model.id;

        let mut splits = Vec::with_capacity(draft.splits.len());
        for split in draft.splits {
            let model = loan_splits::ActiveModel {
                id: ActiveValue::NotSet,
                loan_id: ActiveValue::Set(loan_id),
                bank_id: ActiveValue::Set(split.bank_id),
                split_amount_minor: ActiveValue::Set(split.amount.minor()),
                remaining_principal_minor: ActiveValue::Set(split.amount.minor()),
            }
            .insert(db)
            .await?;
            splits.push(LoanSplit::try_from(model)?);
        }

        Ok((Loan::try_from(loan_model)?, splits))
    }

    pub(super) async fn loan_splits(
        &self,
        db: &DatabaseTransaction,
        loan_id: i64,
    ) -> ResultEngine<Vec<LoanSplit>> {
        loan_splits::Entity::find()
            .filter(loan_splits::Column::LoanId.eq(loan_id))
            .order_by_asc(loan_splits::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(LoanSplit::try_from)
            .collect()
    }
}
