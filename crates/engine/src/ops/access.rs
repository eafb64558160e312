use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, banks, loans, users};

use super::Engine;

impl Engine {
    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))
    }

    pub(super) async fn require_bank(
        &self,
        db: &DatabaseTransaction,
        bank_id: i16,
    ) -> ResultEngine<banks::Model> {
        banks::Entity::find_by_id(bank_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("bank {bank_id}")))
    }

    pub(super) async fn require_loan(
        &self,
        db: &DatabaseTransaction,
        loan_id: i64,
    ) -> ResultEngine<loans::Model> {
        loans::Entity::find_by_id(loan_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("loan {loan_id}")))
    }

    /// Load a loan and check that `user_id` is its borrower.
    pub(super) async fn require_owned_loan(
        &self,
        db: &DatabaseTransaction,
        loan_id: i64,
        user_id: Uuid,
    ) -> ResultEngine<loans::Model> {
        let loan = self.require_loan(db, loan_id).await?;
        if loan.user_id != user_id.to_string() {
            return Err(EngineError::Forbidden(format!(
                "loan {loan_id} belongs to another user"
            )));
        }
        Ok(loan)
    }
}
