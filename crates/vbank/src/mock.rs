use async_trait::async_trait;
use chrono::Utc;

use crate::{
    Account, AccountsResponse, Balance, BalancesResponse, BankingClient, ClientLogin,
    ConsentResponse, DemoClient, Links, Meta, Transaction, TransactionsResponse,
    error::{Result, VBankError},
};

const PERSON_ID: &str = "mock-pid";
const PASSWORD: &str = "password";

/// Offline stand-in with fixed data.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockClient;

#[async_trait]
impl BankingClient for MockClient {
    async fn random_demo_client(&self) -> Result<DemoClient> {
        Ok(DemoClient {
            person_id: PERSON_ID.to_string(),
            full_name: "Mock User".to_string(),
            password: PASSWORD.to_string(),
        })
    }

    async fn bank_token(&self) -> Result<String> {
        Ok("mock-bank-token".to_string())
    }

    async fn login_client(&self, username: &str, password: &str) -> Result<ClientLogin> {
        if username == PERSON_ID && password == PASSWORD {
            return Ok(ClientLogin {
                access_token: "mock-access-token".to_string(),
                token_type: "bearer".to_string(),
                client_id: "mock-client".to_string(),
            });
        }
        Err(VBankError::Api {
            status: 401,
            body: "invalid credentials".to_string(),
        })
    }

    async fn accounts(&self, _client_token: &str) -> Result<AccountsResponse> {
        Ok(AccountsResponse {
            accounts: vec![Account {
                account_id: "mock-acc-1".to_string(),
                currency: "RUB".to_string(),
                account_type: "Personal".to_string(),
                nickname: "Mock Account".to_string(),
                servicer: None,
            }],
            links: Links::default(),
            meta: Meta::default(),
        })
    }

    async fn transactions(
        &self,
        _client_token: &str,
        _account_id: &str,
        _page: Option<u32>,
        _limit: Option<u32>,
    ) -> Result<TransactionsResponse> {
        let now = Utc::now();
        Ok(TransactionsResponse {
            data: vec![Transaction {
                transaction_id: "mock-tx-1".to_string(),
                amount: "1000.00".to_string(),
                currency: "RUB".to_string(),
                credit_debit_indicator: "credit".to_string(),
                status: "completed".to_string(),
                booking_date_time: now,
                value_date_time: now,
                transaction_information: None,
                bank_transaction_code: None,
            }],
            links: Links::default(),
            meta: Meta::default(),
        })
    }

    async fn balances(&self, _client_token: &str, _account_id: &str) -> Result<BalancesResponse> {
        Ok(BalancesResponse {
            data: vec![Balance {
                amount: "5000.00".to_string(),
                currency: "RUB".to_string(),
                kind: None,
            }],
            links: Links::default(),
            meta: Meta::default(),
        })
    }

    async fn create_consent(
        &self,
        _client_id: &str,
        _requesting_bank: &str,
        _requesting_bank_name: &str,
    ) -> Result<ConsentResponse> {
        Ok(ConsentResponse {
            status: "approved".to_string(),
            consent_id: "mock-consent-1".to_string(),
            auto_approved: true,
        })
    }
}
