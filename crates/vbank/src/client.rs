use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::{
    AccountsResponse, BalancesResponse, BankToken, BankingClient, CONSENT_PERMISSIONS,
    ClientLogin, ClientLoginRequest, ConsentRequest, ConsentResponse, DemoClient,
    TransactionsResponse,
    error::{Result, VBankError},
};

const TIMEOUT: Duration = Duration::from_secs(30);
const CONSENT_REASON: &str = "Bank data aggregation for consortium lending";

#[derive(Debug)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct VBankClient {
    base_url: Url,
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
    bank_token: Mutex<Option<CachedToken>>,
}

impl VBankClient {
    pub fn new(base_url: &str, client_id: &str, client_secret: &str) -> Result<Self> {
        // `Url::join` replaces the last segment unless the base ends with `/`.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|err| VBankError::Url(format!("{base_url}: {err}")))?;
        let http = reqwest::Client::builder().timeout(TIMEOUT).build()?;
        Ok(Self {
            base_url,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            http,
            bank_token: Mutex::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| VBankError::Url(format!("{path}: {err}")))
    }
}

async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json::<T>().await?);
    }
    let body = res.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), %body, "virtual bank request failed");
    Err(VBankError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl BankingClient for VBankClient {
    async fn random_demo_client(&self) -> Result<DemoClient> {
        let res = self
            .http
            .get(self.endpoint("auth/random-demo-client")?)
            .send()
            .await?;
        decode(res).await
    }

    async fn bank_token(&self) -> Result<String> {
        // The lock is held across the refresh so concurrent callers share
        // one token request.
        let mut cached = self.bank_token.lock().await;
        if let Some(token) = cached.as_ref()
            && Utc::now() < token.expires_at
        {
            return Ok(token.token.clone());
        }

        let res = self
            .http
            .post(self.endpoint("auth/bank-token")?)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;
        let token: BankToken = decode(res).await?;
        tracing::debug!(expires_in = token.expires_in, "bank token refreshed");

        let expires_at = Utc::now() + chrono::Duration::seconds(token.expires_in);
        *cached = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }

    async fn login_client(&self, username: &str, password: &str) -> Result<ClientLogin> {
        let res = self
            .http
            .post(self.endpoint("auth/login")?)
            .json(&ClientLoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        decode(res).await
    }

    async fn accounts(&self, client_token: &str) -> Result<AccountsResponse> {
        let res = self
            .http
            .get(self.endpoint("accounts")?)
            .bearer_auth(client_token)
            .send()
            .await?;
        decode(res).await
    }

    async fn transactions(
        &self,
        client_token: &str,
        account_id: &str,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<TransactionsResponse> {
        let mut request = self
            .http
            .get(self.endpoint(&format!("accounts/{account_id}/transactions"))?)
            .bearer_auth(client_token);
        if let Some(page) = page.filter(|p| *p > 0) {
            request = request.query(&[("page", page)]);
        }
        if let Some(limit) = limit.filter(|l| *l > 0) {
            request = request.query(&[("limit", limit)]);
        }
        decode(request.send().await?).await
    }

    async fn balances(&self, client_token: &str, account_id: &str) -> Result<BalancesResponse> {
        let res = self
            .http
            .get(self.endpoint(&format!("accounts/{account_id}/balances"))?)
            .bearer_auth(client_token)
            .send()
            .await?;
        decode(res).await
    }

    async fn create_consent(
        &self,
        client_id: &str,
        requesting_bank: &str,
        requesting_bank_name: &str,
    ) -> Result<ConsentResponse> {
        let bank_token = self.bank_token().await?;
        let payload = ConsentRequest {
            client_id: client_id.to_string(),
            permissions: CONSENT_PERMISSIONS.iter().map(ToString::to_string).collect(),
            reason: CONSENT_REASON.to_string(),
            requesting_bank: requesting_bank.to_string(),
            requesting_bank_name: requesting_bank_name.to_string(),
        };
        let res = self
            .http
            .post(self.endpoint("account-consents/request")?)
            .bearer_auth(bank_token)
            .header("X-Requesting-Bank", requesting_bank)
            .json(&payload)
            .send()
            .await?;
        let consent: ConsentResponse = decode(res).await?;
        tracing::info!(
            consent_id = %consent.consent_id,
            status = %consent.status,
            client_id,
            "consent requested"
        );
        Ok(consent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_its_path() {
        let client = VBankClient::new("https://vbank.example/api", "team", "secret").unwrap();
        assert_eq!(
            client.endpoint("auth/login").unwrap().as_str(),
            "https://vbank.example/api/auth/login"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            VBankClient::new("not a url", "team", "secret"),
            Err(VBankError::Url(_))
        ));
    }
}
