//! Payment events against a loan.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, payment_allocations::Allocation, util::parse_uuid};

/// One payment and the allocations it was split into.
///
/// `total_amount` always equals the sum of principal and interest over
/// `allocations`. Payments are never updated after insert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub id: i64,
    pub loan_id: i64,
    pub user_id: Uuid,
    pub paid_at: DateTime<Utc>,
    pub total_amount: Money,
    pub comment: Option<String>,
    pub idempotency_key: Option<String>,
    pub allocations: Vec<Allocation>,
}

impl Payment {
    /// Principal repaid by this payment across all splits.
    #[must_use]
    pub fn principal_paid(&self) -> Money {
        self.allocations.iter().map(|a| a.principal_paid).sum()
    }

    #[must_use]
    pub fn interest_paid(&self) -> Money {
        self.allocations.iter().map(|a| a.interest_paid).sum()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loan_payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub loan_id: i64,
    pub user_id: String,
    pub paid_at: DateTimeUtc,
    pub total_amount_minor: i64,
    pub comment: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loans::Entity",
        from = "Column::LoanId",
        to = "super::loans::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Loans,
    #[sea_orm(has_many = "super::payment_allocations::Entity")]
    Allocations,
}

impl Related<super::loans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl Related<super::payment_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<(Model, Vec<Allocation>)> for Payment {
    type Error = EngineError;

    fn try_from((model, allocations): (Model, Vec<Allocation>)) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            loan_id: model.loan_id,
            user_id: parse_uuid(&model.user_id, "user")?,
            paid_at: model.paid_at,
            total_amount: Money::new(model.total_amount_minor),
            comment: model.comment,
            idempotency_key: model.idempotency_key,
            allocations,
        })
    }
}
