//! Postings on a user's bank account. Expenses are negative amounts.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BankTransaction {
    pub id: i64,
    pub user_id: Uuid,
    pub bank_id: i16,
    pub occurred_at: DateTime<Utc>,
    pub amount: Money,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Postings of a user plus the money spent across them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionHistory {
    pub transactions: Vec<BankTransaction>,
    /// Sum of the absolute value of every negative posting.
    pub total_spent: Money,
}

impl TransactionHistory {
    pub(crate) fn new(transactions: Vec<BankTransaction>) -> Self {
        let total_spent = transactions
            .iter()
            .filter(|tx| tx.amount.is_negative())
            .map(|tx| tx.amount.abs())
            .sum();
        Self {
            transactions,
            total_spent,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    pub bank_id: i16,
    pub occurred_at: DateTimeUtc,
    pub amount_minor: i64,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for BankTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: parse_uuid(&model.user_id, "user")?,
            bank_id: model.bank_id,
            occurred_at: model.occurred_at,
            amount: Money::new(model.amount_minor),
            category: model.category,
            description: model.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn posting(amount: i64) -> BankTransaction {
        BankTransaction {
            id: 1,
            user_id: Uuid::nil(),
            bank_id: 1,
            occurred_at: Utc.timestamp_opt(0, 0).unwrap(),
            amount: Money::new(amount),
            category: None,
            description: None,
        }
    }

    #[test]
    fn total_spent_counts_only_expenses() {
        let history = TransactionHistory::new(vec![posting(100_00), posting(-20_50), posting(-4_50)]);
        assert_eq!(history.total_spent, Money::new(25_00));
        assert_eq!(history.transactions.len(), 3);
    }
}
