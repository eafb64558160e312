//! Loans and their lifecycle status.
//!
//! A loan is always persisted together with its [`LoanSplit`]s; the sum of
//! the split amounts equals `original_amount`.
//!
//! [`LoanSplit`]: crate::LoanSplit

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Rate, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Active,
    Paid,
    Defaulted,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paid => "PAID",
            Self::Defaulted => "DEFAULTED",
        }
    }
}

impl TryFrom<&str> for LoanStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ACTIVE" => Ok(Self::Active),
            "PAID" => Ok(Self::Paid),
            "DEFAULTED" => Ok(Self::Defaulted),
            other => Err(EngineError::InvalidLoanState(format!(
                "unknown loan status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Loan {
    pub id: i64,
    pub user_id: Uuid,
    pub original_amount: Money,
    pub taken_at: DateTime<Utc>,
    pub interest_rate: Rate,
    pub status: LoanStatus,
    pub purpose: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    pub original_amount_minor: i64,
    pub taken_at: DateTimeUtc,
    pub interest_rate_bps: i64,
    pub status: String,
    pub purpose: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::loan_splits::Entity")]
    Splits,
    #[sea_orm(has_many = "super::loan_payments::Entity")]
    Payments,
}

impl Related<super::loan_splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl Related<super::loan_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Loan {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            user_id: parse_uuid(&model.user_id, "user")?,
            original_amount: Money::new(model.original_amount_minor),
            taken_at: model.taken_at,
            interest_rate: Rate::from_basis_points(model.interest_rate_bps)?,
            status: LoanStatus::try_from(model.status.as_str())?,
            purpose: model.purpose,
            created_at: model.created_at,
        })
    }
}
