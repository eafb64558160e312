//! Pass-through endpoints to the virtual bank.
//!
//! Calls that act on a bank client's data need the client token returned by
//! `/banking/login`, sent in the [`CLIENT_TOKEN_HEADER`] header.

use std::sync::Arc;

use api_types::banking::{CLIENT_TOKEN_HEADER, ClientLoginNew, ConsentNew, TransactionsQuery};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use vbank::{
    AccountsResponse, BalancesResponse, BankingClient, ClientLogin, ConsentResponse, DemoClient,
    TransactionsResponse,
};

use crate::{ServerError, server::ServerState};

fn bank(state: &ServerState) -> Result<Arc<dyn BankingClient>, ServerError> {
    state.bank.clone().ok_or(ServerError::BankUnavailable)
}

fn client_token(headers: &HeaderMap) -> Result<&str, ServerError> {
    headers
        .get(CLIENT_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ServerError::Generic(format!("missing {CLIENT_TOKEN_HEADER} header")))
}

pub async fn demo_client(
    State(state): State<ServerState>,
) -> Result<Json<DemoClient>, ServerError> {
    Ok(Json(bank(&state)?.random_demo_client().await?))
}

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<ClientLoginNew>,
) -> Result<Json<ClientLogin>, ServerError> {
    let login = bank(&state)?
        .login_client(&payload.username, &payload.password)
        .await?;
    Ok(Json(login))
}

pub async fn accounts(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> Result<Json<AccountsResponse>, ServerError> {
    let token = client_token(&headers)?;
    Ok(Json(bank(&state)?.accounts(token).await?))
}

pub async fn transactions(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(account_id): Path<String>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<TransactionsResponse>, ServerError> {
    let token = client_token(&headers)?;
    let page = bank(&state)?
        .transactions(token, &account_id, query.page, query.limit)
        .await?;
    Ok(Json(page))
}

pub async fn balances(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(account_id): Path<String>,
) -> Result<Json<BalancesResponse>, ServerError> {
    let token = client_token(&headers)?;
    Ok(Json(bank(&state)?.balances(token, &account_id).await?))
}

/// Request consent to read a client's accounts on behalf of a partner bank.
pub async fn consent(
    State(state): State<ServerState>,
    Json(payload): Json<ConsentNew>,
) -> Result<Json<ConsentResponse>, ServerError> {
    if payload.client_id.trim().is_empty() || payload.requesting_bank.trim().is_empty() {
        return Err(ServerError::Generic(
            "client_id and requesting_bank are required".to_string(),
        ));
    }
    let consent = bank(&state)?
        .create_consent(
            payload.client_id.trim(),
            payload.requesting_bank.trim(),
            payload.requesting_bank_name.trim(),
        )
        .await?;
    Ok(Json(consent))
}
