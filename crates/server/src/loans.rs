//! Loan API endpoints

use api_types::loan::{LoanDetailResponse, LoanListResponse, LoanNew};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{EngineError, NewLoanCmd, SplitSpec, User};
use uuid::Uuid;

use crate::{ServerError, ensure_self, parse_money, parse_rate, server::ServerState, views};

/// Handle requests for creating a loan owned by the caller
pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<LoanNew>,
) -> Result<(StatusCode, Json<LoanDetailResponse>), ServerError> {
    let splits = payload
        .splits
        .iter()
        .map(|split| Ok(SplitSpec::new(split.bank_id, parse_money(&split.amount)?)))
        .collect::<Result<Vec<_>, ServerError>>()?;

    let mut cmd = NewLoanCmd::new(user.id, parse_money(&payload.amount)?, splits)
        .interest_rate(parse_rate(payload.interest_rate.as_deref())?);
    if let Some(purpose) = payload.purpose {
        cmd = cmd.purpose(purpose);
    }

    let detail = state.engine.create_loan(cmd).await?;
    Ok((StatusCode::CREATED, Json(views::loan_detail(&detail))))
}

/// Handle requests for a loan with its splits and payment history
pub async fn detail(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(loan_id): Path<i64>,
) -> Result<Json<LoanDetailResponse>, ServerError> {
    let detail = state.engine.loan_detail(loan_id).await?;
    if detail.loan.user_id != user.id {
        return Err(EngineError::Forbidden(format!("loan {loan_id}")).into());
    }
    Ok(Json(views::loan_detail(&detail)))
}

/// Handle requests for listing the loans of a user
pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<LoanListResponse>, ServerError> {
    ensure_self(&user, user_id)?;
    let loans = state.engine.user_loans(user_id).await?;
    Ok(Json(LoanListResponse {
        loans: loans.iter().map(views::loan).collect(),
    }))
}
