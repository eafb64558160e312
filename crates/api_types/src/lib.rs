//! Request and response bodies of the lending API.
//!
//! Amounts and rates travel as decimal strings (`"123.45"`, `"12.50"`) and
//! are parsed by the server, so clients never deal with floating point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod loan {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SplitNew {
        pub bank_id: i16,
        pub amount: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanNew {
        pub amount: String,
        /// Percent per year, defaults to `"0.00"`.
        pub interest_rate: Option<String>,
        pub purpose: Option<String>,
        pub splits: Vec<SplitNew>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanView {
        pub id: i64,
        pub user_id: Uuid,
        pub original_amount: String,
        pub interest_rate: String,
        /// `ACTIVE`, `PAID` or `DEFAULTED`.
        pub status: String,
        pub purpose: Option<String>,
        pub taken_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitView {
        pub id: i64,
        pub bank_id: i16,
        pub split_amount: String,
        pub remaining_principal: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanDetailResponse {
        pub loan: LoanView,
        pub splits: Vec<SplitView>,
        /// Fraction in `[0, 1]`, 4 decimals.
        pub percent_paid: String,
        pub remaining_debt: String,
        pub payment_history: Vec<super::payment::PaymentView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanListResponse {
        pub loans: Vec<LoanView>,
    }
}

pub mod payment {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AllocationNew {
        pub split_id: i64,
        pub principal_paid: String,
        pub interest_paid: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentNew {
        pub total_amount: String,
        pub allocations: Vec<AllocationNew>,
        pub comment: Option<String>,
        /// Optional idempotency key for safely retrying the same payment.
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AllocationView {
        pub id: i64,
        pub split_id: i64,
        pub principal_paid: String,
        pub interest_paid: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentView {
        pub id: i64,
        pub loan_id: i64,
        pub paid_at: DateTime<Utc>,
        pub total_amount: String,
        pub comment: Option<String>,
        pub allocations: Vec<AllocationView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlanRequest {
        pub total_amount: String,
    }

    /// Proposed allocations, ready to be sent back as a [`PaymentNew`].
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlanResponse {
        pub total_amount: String,
        pub allocations: Vec<AllocationNew>,
    }
}

pub mod application {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ApplicationNew {
        pub bank_id: i16,
        pub type_code: String,
        pub requested_amount: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ApplicationApprove {
        pub splits: Vec<super::loan::SplitNew>,
        pub interest_rate: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ApplicationApproved {
        pub loan_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ApplicationView {
        pub id: i64,
        pub bank_id: i16,
        pub type_code: String,
        /// `PENDING`, `APPROVED` or `REJECTED`.
        pub status: String,
        pub requested_amount: String,
        pub loan_id: Option<i64>,
        pub submitted_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ApplicationListResponse {
        pub applications: Vec<ApplicationView>,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DebtResponse {
        pub total_debt: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceResponse {
        pub total_balance: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryResponse {
        pub total_balance: String,
        pub total_debt: String,
        pub active_loans: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: i64,
        pub bank_id: i16,
        pub balance: String,
        pub currency: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountListResponse {
        pub accounts: Vec<AccountView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i64,
        pub bank_id: i16,
        pub occurred_at: DateTime<Utc>,
        /// Signed: negative amounts are spending.
        pub amount: String,
        pub category: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionHistoryResponse {
        pub transactions: Vec<TransactionView>,
        pub total_spent: String,
    }
}

/// Requests forwarded to the virtual bank. Responses are the bank's own
/// payloads and are defined by the `vbank` crate.
pub mod banking {
    use super::*;

    /// Header carrying the client token returned by the bank login.
    pub const CLIENT_TOKEN_HEADER: &str = "x-vbank-token";

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClientLoginNew {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionsQuery {
        pub page: Option<u32>,
        pub limit: Option<u32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ConsentNew {
        pub client_id: String,
        pub requesting_bank: String,
        pub requesting_bank_name: String,
    }
}
