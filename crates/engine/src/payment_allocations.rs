use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::Money;

/// The part of a payment applied to one split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub id: i64,
    pub payment_id: i64,
    pub split_id: i64,
    pub principal_paid: Money,
    pub interest_paid: Money,
}

impl Allocation {
    #[must_use]
    pub fn total(&self) -> Money {
        self.principal_paid + self.interest_paid
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_allocations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub payment_id: i64,
    pub split_id: i64,
    pub principal_paid_minor: i64,
    pub interest_paid_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loan_payments::Entity",
        from = "Column::PaymentId",
        to = "super::loan_payments::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Payments,
    #[sea_orm(
        belongs_to = "super::loan_splits::Entity",
        from = "Column::SplitId",
        to = "super::loan_splits::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Splits,
}

impl Related<super::loan_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::loan_splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Allocation {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            payment_id: model.payment_id,
            split_id: model.split_id,
            principal_paid: Money::new(model.principal_paid_minor),
            interest_paid: Money::new(model.interest_paid_minor),
        }
    }
}
