//! Command structs for engine operations.
//!
//! These types group parameters for write operations (loan creation,
//! payments, account postings), keeping call sites readable and avoiding
//! long argument lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Money, Rate};

/// The amount one bank funds in a new loan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSpec {
    pub bank_id: i16,
    pub amount: Money,
}

impl SplitSpec {
    #[must_use]
    pub fn new(bank_id: i16, amount: Money) -> Self {
        Self { bank_id, amount }
    }
}

/// Principal and interest to apply to one split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSpec {
    pub split_id: i64,
    pub principal_paid: Money,
    pub interest_paid: Money,
}

impl AllocationSpec {
    #[must_use]
    pub fn new(split_id: i64, principal_paid: Money, interest_paid: Money) -> Self {
        Self {
            split_id,
            principal_paid,
            interest_paid,
        }
    }
}

/// Create a loan directly, without an application.
#[derive(Clone, Debug)]
pub struct NewLoanCmd {
    pub user_id: Uuid,
    pub original_amount: Money,
    pub interest_rate: Rate,
    pub purpose: Option<String>,
    pub splits: Vec<SplitSpec>,
}

impl NewLoanCmd {
    #[must_use]
    pub fn new(user_id: Uuid, original_amount: Money, splits: Vec<SplitSpec>) -> Self {
        Self {
            user_id,
            original_amount,
            interest_rate: Rate::ZERO,
            purpose: None,
            splits,
        }
    }

    #[must_use]
    pub fn interest_rate(mut self, rate: Rate) -> Self {
        self.interest_rate = rate;
        self
    }

    #[must_use]
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }
}

/// Pay towards a loan.
#[derive(Clone, Debug)]
pub struct PaymentCmd {
    pub loan_id: i64,
    pub user_id: Uuid,
    pub total_amount: Money,
    pub allocations: Vec<AllocationSpec>,
    pub comment: Option<String>,
    /// Retrying with the same key returns the first payment instead of
    /// paying twice.
    pub idempotency_key: Option<String>,
    /// Defaults to the engine clock.
    pub paid_at: Option<DateTime<Utc>>,
}

impl PaymentCmd {
    #[must_use]
    pub fn new(
        loan_id: i64,
        user_id: Uuid,
        total_amount: Money,
        allocations: Vec<AllocationSpec>,
    ) -> Self {
        Self {
            loan_id,
            user_id,
            total_amount,
            allocations,
            comment: None,
            idempotency_key: None,
            paid_at: None,
        }
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn paid_at(mut self, paid_at: DateTime<Utc>) -> Self {
        self.paid_at = Some(paid_at);
        self
    }
}

/// Post a movement on a user's bank account.
#[derive(Clone, Debug)]
pub struct PostingCmd {
    pub user_id: Uuid,
    pub bank_id: i16,
    /// Signed: negative for expenses.
    pub amount: Money,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl PostingCmd {
    #[must_use]
    pub fn new(user_id: Uuid, bank_id: i16, amount: Money) -> Self {
        Self {
            user_id,
            bank_id,
            amount,
            category: None,
            description: None,
            occurred_at: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }
}
