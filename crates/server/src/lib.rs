use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, Money, Rate, User};
use uuid::Uuid;
use vbank::VBankError;

use api_types::ErrorBody;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod applications;
mod banking;
mod loans;
mod payments;
mod server;
mod users;
mod views;

pub enum ServerError {
    Engine(EngineError),
    Bank(VBankError),
    /// No virtual bank client is configured.
    BankUnavailable,
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_)
        | EngineError::ApplicationNotPending(_)
        | EngineError::OverAllocation(_)
        | EngineError::InvalidLoanState(_) => StatusCode::CONFLICT,
        EngineError::Database(_) | EngineError::PasswordHash(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::InvalidSplit(_)
        | EngineError::AmountMismatch(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidInput(_)
        | EngineError::InvalidId(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::PasswordHash(hash_err) => {
            tracing::error!("password hash error: {hash_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

fn status_and_message_for_bank_error(err: VBankError) -> (StatusCode, String) {
    match err {
        VBankError::Url(url_err) => {
            tracing::error!("virtual bank misconfigured: {url_err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
        other => {
            tracing::warn!("virtual bank call failed: {other}");
            (StatusCode::BAD_GATEWAY, other.to_string())
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Bank(err) => status_and_message_for_bank_error(err),
            ServerError::BankUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "virtual bank is not configured".to_string(),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<VBankError> for ServerError {
    fn from(value: VBankError) -> Self {
        Self::Bank(value)
    }
}

fn parse_money(value: &str) -> Result<Money, ServerError> {
    Ok(value.parse::<Money>()?)
}

fn parse_rate(value: Option<&str>) -> Result<Rate, ServerError> {
    match value {
        Some(value) => Ok(value.parse::<Rate>()?),
        None => Ok(Rate::ZERO),
    }
}

/// Callers may only read their own `/users/{id}/...` resources.
fn ensure_self(user: &User, user_id: Uuid) -> Result<(), ServerError> {
    if user.id != user_id {
        return Err(EngineError::Forbidden(format!("user {user_id}")).into());
    }
    Ok(())
}
