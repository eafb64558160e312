//! The portion of a loan funded by one bank.

use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::{EngineError, Money};

/// One bank's share of a loan.
///
/// `remaining_principal` starts equal to `split_amount` and only decreases,
/// through payment allocations. It never goes below zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoanSplit {
    pub id: i64,
    pub loan_id: i64,
    pub bank_id: i16,
    pub split_amount: Money,
    pub remaining_principal: Money,
}

impl LoanSplit {
    /// Principal already repaid on this split.
    #[must_use]
    pub fn principal_paid(&self) -> Money {
        self.split_amount - self.remaining_principal
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loan_splits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub loan_id: i64,
    pub bank_id: i16,
    pub split_amount_minor: i64,
    pub remaining_principal_minor: i64,
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
    #[sea_orm(
        belongs_to = "super::banks::Entity",
        from = "Column::BankId",
        to = "super::banks::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Banks,
    #[sea_orm(has_many = "super::payment_allocations::Entity")]
    Allocations,
}

impl Related<super::loans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl Related<super::banks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Banks.def()
    }
}

impl Related<super::payment_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for LoanSplit {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        if model.remaining_principal_minor < 0
            || model.remaining_principal_minor > model.split_amount_minor
        {
            return Err(EngineError::InvalidAmount(format!(
                "split {} has remaining principal outside [0, split amount]",
                model.id
            )));
        }
        Ok(Self {
            id: model.id,
            loan_id: model.loan_id,
            bank_id: model.bank_id,
            split_amount: Money::new(model.split_amount_minor),
            remaining_principal: Money::new(model.remaining_principal_minor),
        })
    }
}
