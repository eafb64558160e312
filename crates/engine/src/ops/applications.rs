//! Credit applications: submission and the approve/reject decision.

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    ApplicationStatus, CreditApplication, EngineError, Money, Rate, ResultEngine, SplitSpec,
    credit_applications,
    util::{normalize_required_text, validate_splits},
};

use super::{Engine, loans::LoanDraft, with_tx};

impl Engine {
    /// Submit a credit application. It starts `PENDING`.
    pub async fn submit_application(
        &self,
        user_id: Uuid,
        bank_id: i16,
        type_code: &str,
        requested_amount: Money,
    ) -> ResultEngine<CreditApplication> {
        let type_code = normalize_required_text(type_code, "application type")?;
        if !requested_amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "requested amount must be > 0".to_string(),
            ));
        }
        let now = self.now();

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.require_bank(&db_tx, bank_id).await?;
            let model = credit_applications::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(user_id.to_string()),
                bank_id: ActiveValue::Set(bank_id),
                type_code: ActiveValue::Set(type_code),
                status_code: ActiveValue::Set(ApplicationStatus::Pending.as_str().to_string()),
                requested_amount_minor: ActiveValue::Set(requested_amount.minor()),
                loan_id: ActiveValue::Set(None),
                submitted_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(application_id = model.id, %user_id, bank_id, "application submitted");
            CreditApplication::try_from(model)
        })
    }

    /// Applications of a user, most recent first.
    pub async fn applications(&self, user_id: Uuid) -> ResultEngine<Vec<CreditApplication>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            credit_applications::Entity::find()
                .filter(credit_applications::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(credit_applications::Column::SubmittedAt)
                .order_by_desc(credit_applications::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(CreditApplication::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn application(&self, application_id: i64) -> ResultEngine<CreditApplication> {
        with_tx!(self, |db_tx| {
            let model = self.require_application(&db_tx, application_id).await?;
            CreditApplication::try_from(model)
        })
    }

    /// Approve a pending application, creating its loan.
    ///
    /// `splits` must fund the requested amount exactly. The loan, its splits
    /// and the status change commit together; on any error the application
    /// stays `PENDING` and no loan exists.
    pub async fn approve_application(
        &self,
        application_id: i64,
        splits: &[SplitSpec],
        interest_rate: Rate,
    ) -> ResultEngine<i64> {
        let now = self.now();
        with_tx!(self, |db_tx| {
            let application = self.require_application(&db_tx, application_id).await?;
            ensure_pending(&application)?;

            let requested_amount = Money::new(application.requested_amount_minor);
            validate_splits(requested_amount, splits)?;

            let user_id = crate::util::parse_uuid(&application.user_id, "user")?;
            let draft = LoanDraft {
                user_id,
                original_amount: requested_amount,
                interest_rate,
                purpose: Some(application.type_code.clone()),
                splits,
                created_at: now,
            };
            let (loan, _) = self.insert_loan(&db_tx, &draft).await?;

            self.transition_application(
                &db_tx,
                application_id,
                ApplicationStatus::Approved,
                Some(loan.id),
                now,
            )
            .await?;

            tracing::info!(application_id, loan_id = loan.id, "application approved");
            Ok(loan.id)
        })
    }

    /// Reject a pending application.
    pub async fn reject_application(&self, application_id: i64) -> ResultEngine<()> {
        let now = self.now();
        with_tx!(self, |db_tx| {
            let application = self.require_application(&db_tx, application_id).await?;
            ensure_pending(&application)?;
            self.transition_application(
                &db_tx,
                application_id,
                ApplicationStatus::Rejected,
                None,
                now,
            )
            .await?;
            tracing::info!(application_id, "application rejected");
            Ok(())
        })
    }

    async fn require_application(
        &self,
        db: &DatabaseTransaction,
        application_id: i64,
    ) -> ResultEngine<credit_applications::Model> {
        credit_applications::Entity::find_by_id(application_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("application {application_id}")))
    }

    /// Move a `PENDING` application to `status`.
    ///
    /// The update only matches while the row is still pending, so a
    /// concurrent decision makes this fail instead of overwriting it.
    async fn transition_application(
        &self,
        db: &DatabaseTransaction,
        application_id: i64,
        status: ApplicationStatus,
        loan_id: Option<i64>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> ResultEngine<()> {
        let updated = credit_applications::Entity::update_many()
            .col_expr(
                credit_applications::Column::StatusCode,
                Expr::value(status.as_str()),
            )
            .col_expr(credit_applications::Column::LoanId, Expr::value(loan_id))
            .col_expr(credit_applications::Column::UpdatedAt, Expr::value(now))
            .filter(credit_applications::Column::Id.eq(application_id))
            .filter(
                credit_applications::Column::StatusCode.eq(ApplicationStatus::Pending.as_str()),
            )
            .exec(db)
            .await?;
        if updated.rows_affected != 1 {
            return Err(EngineError::ApplicationNotPending(format!(
                "application {application_id}"
            )));
        }
        Ok(())
    }
}

fn ensure_pending(application: &credit_applications::Model) -> ResultEngine<()> {
    let status = ApplicationStatus::try_from(application.status_code.as_str())?;
    if status != ApplicationStatus::Pending {
        return Err(EngineError::ApplicationNotPending(format!(
            "application {} is {}",
            application.id,
            status.as_str()
        )));
    }
    Ok(())
}
