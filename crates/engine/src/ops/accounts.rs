//! Bank accounts and the postings that feed their balances.

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, Statement, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    BankAccount, BankTransaction, EngineError, PostingCmd, ResultEngine, TransactionHistory,
    bank_accounts, bank_transactions,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Open an account for `user_id` at `bank_id` with a zero balance.
    pub async fn open_account(
        &self,
        user_id: Uuid,
        bank_id: i16,
        currency: &str,
    ) -> ResultEngine<BankAccount> {
        let currency = normalize_required_text(currency, "currency")?.to_uppercase();
        let created_at = self.now();
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.require_bank(&db_tx, bank_id).await?;
            if self.find_account(&db_tx, user_id, bank_id).await?.is_some() {
                return Err(EngineError::ExistingKey(format!(
                    "account at bank {bank_id}"
                )));
            }
            let model = bank_accounts::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(user_id.to_string()),
                bank_id: ActiveValue::Set(bank_id),
                balance_minor: ActiveValue::Set(0),
                currency: ActiveValue::Set(currency),
                created_at: ActiveValue::Set(created_at),
            }
            .insert(&db_tx)
            .await?;
            BankAccount::try_from(model)
        })
    }

    /// Accounts of a user, ordered by bank.
    pub async fn accounts(&self, user_id: Uuid) -> ResultEngine<Vec<BankAccount>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            bank_accounts::Entity::find()
                .filter(bank_accounts::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(bank_accounts::Column::BankId)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(BankAccount::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Record a posting and apply it to the matching account balance.
    pub async fn record_transaction(&self, cmd: PostingCmd) -> ResultEngine<BankTransaction> {
        if cmd.amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "posting amount must not be 0".to_string(),
            ));
        }
        let occurred_at = cmd.occurred_at.unwrap_or_else(|| self.now());
        with_tx!(self, |db_tx| {
            let account = self
                .find_account(&db_tx, cmd.user_id, cmd.bank_id)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound(format!(
                        "account of user {} at bank {}",
                        cmd.user_id, cmd.bank_id
                    ))
                })?;

            let model = bank_transactions::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(cmd.user_id.to_string()),
                bank_id: ActiveValue::Set(cmd.bank_id),
                occurred_at: ActiveValue::Set(occurred_at),
                amount_minor: ActiveValue::Set(cmd.amount.minor()),
                category: ActiveValue::Set(normalize_optional_text(cmd.category.as_deref())),
                description: ActiveValue::Set(normalize_optional_text(cmd.description.as_deref())),
            }
            .insert(&db_tx)
            .await?;

            let stmt = Statement::from_sql_and_values(
                db_tx.get_database_backend(),
                "UPDATE user_bank_accounts SET balance_minor = balance_minor + ? WHERE id = ?",
                vec![cmd.amount.minor().into(), account.id.into()],
            );
            db_tx.execute(stmt).await?;

            BankTransaction::try_from(model)
        })
    }

    /// All postings of a user, most recent first, with the total spent.
    pub async fn transaction_history(&self, user_id: Uuid) -> ResultEngine<TransactionHistory> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let transactions = self.postings(&db_tx, user_id, None).await?;
            Ok(TransactionHistory::new(transactions))
        })
    }

    /// Postings of a user at one bank, most recent first, with the total spent.
    pub async fn bank_transaction_history(
        &self,
        user_id: Uuid,
        bank_id: i16,
    ) -> ResultEngine<TransactionHistory> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.require_bank(&db_tx, bank_id).await?;
            let transactions = self.postings(&db_tx, user_id, Some(bank_id)).await?;
            Ok(TransactionHistory::new(transactions))
        })
    }

    async fn postings(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        bank_id: Option<i16>,
    ) -> ResultEngine<Vec<BankTransaction>> {
        let mut query = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::UserId.eq(user_id.to_string()));
        if let Some(bank_id) = bank_id {
            query = query.filter(bank_transactions::Column::BankId.eq(bank_id));
        }
        query
            .order_by_desc(bank_transactions::Column::OccurredAt)
            .order_by_desc(bank_transactions::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(BankTransaction::try_from)
            .collect()
    }

    async fn find_account(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        bank_id: i16,
    ) -> ResultEngine<Option<bank_accounts::Model>> {
        Ok(bank_accounts::Entity::find()
            .filter(bank_accounts::Column::UserId.eq(user_id.to_string()))
            .filter(bank_accounts::Column::BankId.eq(bank_id))
            .one(db)
            .await?)
    }
}
