use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::{collections::HashSet, net::SocketAddr, sync::Arc};

use crate::{applications, banking, loans, payments, users};
use engine::{Engine, User};
use vbank::BankingClient;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Emails of the users allowed to decide on credit applications.
    pub admins: Arc<HashSet<String>>,
    /// Virtual bank behind the `/banking` routes, if configured.
    pub bank: Option<Arc<dyn BankingClient>>,
}

impl ServerState {
    pub fn new(engine: Engine, admins: impl IntoIterator<Item = String>) -> Self {
        Self {
            engine: Arc::new(engine),
            admins: Arc::new(
                admins
                    .into_iter()
                    .map(|email| email.trim().to_lowercase())
                    .collect(),
            ),
            bank: None,
        }
    }

    #[must_use]
    pub fn with_bank(mut self, bank: Arc<dyn BankingClient>) -> Self {
        self.bank = Some(bank);
        self
    }

    pub(crate) fn is_admin(&self, user: &User) -> bool {
        self.admins.contains(&user.email)
    }
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user = state
        .engine
        .authenticate(auth_header.username(), auth_header.password())
        .await
        .map_err(|err| {
            tracing::error!("authentication failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/loans", post(loans::create))
        .route("/loans/{id}", get(loans::detail))
        .route("/loans/{id}/payment", post(payments::pay))
        .route("/loans/{id}/plan", post(payments::plan))
        .route("/users/{id}/loans", get(loans::list))
        .route("/users/{id}/debt", get(users::debt))
        .route("/users/{id}/balance", get(users::balance))
        .route("/users/{id}/summary", get(users::summary))
        .route("/users/{id}/accounts", get(users::accounts))
        .route("/users/{id}/transactions", get(users::transactions))
        .route(
            "/users/{id}/banks/{bank_id}/transactions",
            get(users::bank_transactions),
        )
        .route("/users/{id}/applications", get(applications::list))
        .route("/applications", post(applications::submit))
        .route("/applications/{id}/approve", post(applications::approve))
        .route("/applications/{id}/reject", post(applications::reject))
        .route("/banking/demo-client", get(banking::demo_client))
        .route("/banking/login", post(banking::login))
        .route("/banking/accounts", get(banking::accounts))
        .route(
            "/banking/accounts/{account_id}/transactions",
            get(banking::transactions),
        )
        .route(
            "/banking/accounts/{account_id}/balances",
            get(banking::balances),
        )
        .route("/banking/consent", post(banking::consent))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(state: ServerState, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(state, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(banking = state.bank.is_some(), "Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
