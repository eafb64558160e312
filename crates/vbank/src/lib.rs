//! Client for the Virtual Bank open-banking sandbox.
//!
//! [`VBankClient`] talks to the real API; [`MockClient`] returns fixed
//! fixtures so the rest of the system can run without network access.

use async_trait::async_trait;

pub use client::VBankClient;
pub use error::{Result, VBankError};
pub use mock::MockClient;
pub use types::*;

mod client;
mod error;
mod mock;
mod types;

#[async_trait]
pub trait BankingClient: Send + Sync {
    async fn random_demo_client(&self) -> Result<DemoClient>;

    /// Token for bank-to-bank calls. Cached until it expires.
    async fn bank_token(&self) -> Result<String>;

    async fn login_client(&self, username: &str, password: &str) -> Result<ClientLogin>;

    async fn accounts(&self, client_token: &str) -> Result<AccountsResponse>;

    /// `page` and `limit` are sent only when set.
    async fn transactions(
        &self,
        client_token: &str,
        account_id: &str,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<TransactionsResponse>;

    async fn balances(&self, client_token: &str, account_id: &str) -> Result<BalancesResponse>;

    /// Ask the client for access to accounts, balances and transactions on
    /// behalf of `requesting_bank`.
    async fn create_consent(
        &self,
        client_id: &str,
        requesting_bank: &str,
        requesting_bank_name: &str,
    ) -> Result<ConsentResponse>;
}

/// Connection settings of the live API.
#[derive(Clone, Debug)]
pub struct VBankSettings {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Live,
    Mock,
}

/// Pick the client implementation for `mode`.
pub fn client_for(mode: Mode, settings: &VBankSettings) -> Result<Box<dyn BankingClient>> {
    Ok(match mode {
        Mode::Live => Box::new(VBankClient::new(
            &settings.base_url,
            &settings.client_id,
            &settings.client_secret,
        )?),
        Mode::Mock => Box::new(MockClient),
    })
}
