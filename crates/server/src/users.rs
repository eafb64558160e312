//! Per-user aggregate endpoints

use api_types::user::{
    AccountListResponse, BalanceResponse, DebtResponse, SummaryResponse,
    TransactionHistoryResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::User;
use uuid::Uuid;

use crate::{ServerError, ensure_self, server::ServerState, views};

pub async fn debt(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<DebtResponse>, ServerError> {
    ensure_self(&user, user_id)?;
    let total_debt = state.engine.total_debt(user_id).await?;
    Ok(Json(DebtResponse {
        total_debt: total_debt.to_string(),
    }))
}

pub async fn balance(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, ServerError> {
    ensure_self(&user, user_id)?;
    let total_balance = state.engine.total_balance(user_id).await?;
    Ok(Json(BalanceResponse {
        total_balance: total_balance.to_string(),
    }))
}

/// Handle requests for the dashboard figures of a user
pub async fn summary(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SummaryResponse>, ServerError> {
    ensure_self(&user, user_id)?;
    let summary = state.engine.user_summary(user_id).await?;
    Ok(Json(SummaryResponse {
        total_balance: summary.total_balance.to_string(),
        total_debt: summary.total_debt.to_string(),
        active_loans: summary.active_loans,
    }))
}

pub async fn accounts(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AccountListResponse>, ServerError> {
    ensure_self(&user, user_id)?;
    let accounts = state.engine.accounts(user_id).await?;
    Ok(Json(AccountListResponse {
        accounts: accounts.iter().map(views::account).collect(),
    }))
}

pub async fn transactions(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<TransactionHistoryResponse>, ServerError> {
    ensure_self(&user, user_id)?;
    let history = state.engine.transaction_history(user_id).await?;
    Ok(Json(views::history(&history)))
}

pub async fn bank_transactions(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((user_id, bank_id)): Path<(Uuid, i16)>,
) -> Result<Json<TransactionHistoryResponse>, ServerError> {
    ensure_self(&user, user_id)?;
    let history = state
        .engine
        .bank_transaction_history(user_id, bank_id)
        .await?;
    Ok(Json(views::history(&history)))
}
