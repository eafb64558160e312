//! Read-side figures derived from committed loan and account state.
//!
//! Nothing here is cached: every call reads the current rows.

use rust_decimal::Decimal;
use sea_orm::{Statement, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{Loan, LoanSplit, LoanStatus, Money, Payment, ResultEngine, util::query_sum};

use super::{Engine, with_tx};

/// A loan with its splits, repayment progress and payment history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoanDetail {
    pub loan: Loan,
    pub splits: Vec<LoanSplit>,
    /// Share of the original principal already repaid, in `[0, 1]`.
    pub percent_paid: Decimal,
    pub remaining_debt: Money,
    /// Most recent first.
    pub payment_history: Vec<Payment>,
}

impl LoanDetail {
    pub(crate) fn new(loan: Loan, splits: Vec<LoanSplit>, payment_history: Vec<Payment>) -> Self {
        let remaining_debt: Money = splits.iter().map(|s| s.remaining_principal).sum();
        let repaid = loan.original_amount - remaining_debt;
        let percent_paid = repaid.ratio_of(loan.original_amount);
        Self {
            loan,
            splits,
            percent_paid,
            remaining_debt,
            payment_history,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub total_balance: Money,
    pub total_debt: Money,
    pub active_loans: u64,
}

impl Engine {
    /// Loan, splits and payment history read from one consistent snapshot.
    pub async fn loan_detail(&self, loan_id: i64) -> ResultEngine<LoanDetail> {
        with_tx!(self, |db_tx| {
            let loan = Loan::try_from(self.require_loan(&db_tx, loan_id).await?)?;
            let splits = self.loan_splits(&db_tx, loan_id).await?;
            let history = self.loan_payments(&db_tx, loan_id).await?;
            Ok(LoanDetail::new(loan, splits, history))
        })
    }

    /// Remaining principal over all `ACTIVE` loans of the user.
    pub async fn total_debt(&self, user_id: Uuid) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            sum_query(&db_tx, TOTAL_DEBT_SQL, user_id).await
        })
    }

    /// Sum of the balances of the user's bank accounts.
    pub async fn total_balance(&self, user_id: Uuid) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            sum_query(&db_tx, TOTAL_BALANCE_SQL, user_id).await
        })
    }

    /// Balance, debt and active loan count, read together.
    pub async fn user_summary(&self, user_id: Uuid) -> ResultEngine<UserSummary> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let total_balance = sum_query(&db_tx, TOTAL_BALANCE_SQL, user_id).await?;
            let total_debt = sum_query(&db_tx, TOTAL_DEBT_SQL, user_id).await?;
            let active_loans = crate::loans::Entity::find()
                .filter(crate::loans::Column::UserId.eq(user_id.to_string()))
                .filter(crate::loans::Column::Status.eq(LoanStatus::Active.as_str()))
                .count(&db_tx)
                .await?;
            Ok(UserSummary {
                total_balance,
                total_debt,
                active_loans,
            })
        })
    }
}

const TOTAL_DEBT_SQL: &str = "SELECT COALESCE(SUM(s.remaining_principal_minor), 0) AS sum \
     FROM loan_splits s \
     JOIN loans l ON l.id = s.loan_id \
     WHERE l.user_id = ? AND l.status = 'ACTIVE'";

const TOTAL_BALANCE_SQL: &str = "SELECT COALESCE(SUM(balance_minor), 0) AS sum \
     FROM user_bank_accounts WHERE user_id = ?";

async fn sum_query(
    db: &sea_orm::DatabaseTransaction,
    sql: &str,
    user_id: Uuid,
) -> ResultEngine<Money> {
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        sql,
        vec![user_id.to_string().into()],
    );
    query_sum(db, stmt).await
}
