//! Credit application endpoints
//!
//! Any user can apply; approving and rejecting is reserved to the
//! configured admins.

use api_types::application::{
    ApplicationApprove, ApplicationApproved, ApplicationListResponse, ApplicationNew,
    ApplicationView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{EngineError, SplitSpec, User};
use uuid::Uuid;

use crate::{ServerError, ensure_self, parse_money, parse_rate, server::ServerState, views};

fn require_admin(state: &ServerState, user: &User) -> Result<(), ServerError> {
    if !state.is_admin(user) {
        return Err(EngineError::Forbidden("admin only".to_string()).into());
    }
    Ok(())
}

pub async fn submit(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<ApplicationNew>,
) -> Result<(StatusCode, Json<ApplicationView>), ServerError> {
    let application = state
        .engine
        .submit_application(
            user.id,
            payload.bank_id,
            &payload.type_code,
            parse_money(&payload.requested_amount)?,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(views::application(&application))))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApplicationListResponse>, ServerError> {
    ensure_self(&user, user_id)?;
    let applications = state.engine.applications(user_id).await?;
    Ok(Json(ApplicationListResponse {
        applications: applications.iter().map(views::application).collect(),
    }))
}

pub async fn approve(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(application_id): Path<i64>,
    Json(payload): Json<ApplicationApprove>,
) -> Result<Json<ApplicationApproved>, ServerError> {
    require_admin(&state, &user)?;
    let splits = payload
        .splits
        .iter()
        .map(|split| Ok(SplitSpec::new(split.bank_id, parse_money(&split.amount)?)))
        .collect::<Result<Vec<_>, ServerError>>()?;
    let rate = parse_rate(payload.interest_rate.as_deref())?;

    let loan_id = state
        .engine
        .approve_application(application_id, &splits, rate)
        .await?;
    tracing::info!(application_id, loan_id, admin = %user.email, "application approved via api");
    Ok(Json(ApplicationApproved { loan_id }))
}

pub async fn reject(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(application_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    require_admin(&state, &user)?;
    state.engine.reject_application(application_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
