//! Wire format of the Virtual Bank open-banking API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Permissions requested for every consent.
pub const CONSENT_PERMISSIONS: [&str; 3] =
    ["ReadAccountsDetail", "ReadBalances", "ReadTransactionsDetail"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoClient {
    pub person_id: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BankToken {
    pub access_token: String,
    pub token_type: String,
    pub client_id: String,
    /// Seconds.
    pub expires_in: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientLogin {
    pub access_token: String,
    pub token_type: String,
    pub client_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Servicer {
    pub scheme_name: String,
    pub identification: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub currency: String,
    pub account_type: String,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servicer: Option<Servicer>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Decimal string, e.g. `"5000.00"`.
    pub amount: String,
    pub currency: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCode {
    pub code: String,
    pub sub_code: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub amount: String,
    pub currency: String,
    /// `credit` or `debit`.
    pub credit_debit_indicator: String,
    pub status: String,
    pub booking_date_time: DateTime<Utc>,
    pub value_date_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_transaction_code: Option<TransactionCode>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default)]
    pub self_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsResponse {
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub data: Vec<Transaction>,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancesResponse {
    pub data: Vec<Balance>,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsentRequest {
    pub client_id: String,
    pub permissions: Vec<String>,
    pub reason: String,
    pub requesting_bank: String,
    pub requesting_bank_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentResponse {
    pub status: String,
    pub consent_id: String,
    pub auto_approved: bool,
}
