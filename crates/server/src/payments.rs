//! Payment API endpoints

use api_types::payment::{PaymentNew, PaymentView, PlanRequest, PlanResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{AllocationSpec, PaymentCmd, User};

use crate::{ServerError, parse_money, server::ServerState, views};

/// Handle requests for paying a loan of the caller
pub async fn pay(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(loan_id): Path<i64>,
    Json(payload): Json<PaymentNew>,
) -> Result<(StatusCode, Json<PaymentView>), ServerError> {
    let allocations = payload
        .allocations
        .iter()
        .map(|a| {
            Ok(AllocationSpec::new(
                a.split_id,
                parse_money(&a.principal_paid)?,
                parse_money(&a.interest_paid)?,
            ))
        })
        .collect::<Result<Vec<_>, ServerError>>()?;

    let mut cmd = PaymentCmd::new(
        loan_id,
        user.id,
        parse_money(&payload.total_amount)?,
        allocations,
    );
    if let Some(comment) = payload.comment {
        cmd = cmd.comment(comment);
    }
    if let Some(key) = payload.idempotency_key {
        cmd = cmd.idempotency_key(key);
    }

    let payment = state.engine.make_payment(cmd).await?;
    Ok((StatusCode::CREATED, Json(views::payment(&payment))))
}

/// Handle requests for a proposed split of a payment amount
pub async fn plan(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(loan_id): Path<i64>,
    Json(payload): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ServerError> {
    let total_amount = parse_money(&payload.total_amount)?;
    let plan = state
        .engine
        .plan_payment(loan_id, user.id, total_amount)
        .await?;
    Ok(Json(PlanResponse {
        total_amount: total_amount.to_string(),
        allocations: plan.iter().map(views::planned).collect(),
    }))
}
