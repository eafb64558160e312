use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde_json::{Value, json};

use vbank::{BankingClient, VBankClient, VBankError};

#[derive(Clone, Default)]
struct Stub {
    token_requests: Arc<AtomicUsize>,
}

async fn bank_token(
    State(stub): State<Stub>,
    Query(query): Query<std::collections::HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    if query.get("client_secret").map(String::as_str) != Some("secret") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    stub.token_requests.fetch_add(1, Ordering::SeqCst);
    Ok(Json(json!({
        "access_token": "bank-token",
        "token_type": "bearer",
        "client_id": "team",
        "expires_in": 3600
    })))
}

async fn consent(headers: HeaderMap, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer bank-token");
    let requesting = headers
        .get("x-requesting-bank")
        .and_then(|v| v.to_str().ok())
        == Some("team");
    if !authorized || !requesting || body["permissions"].as_array().map(Vec::len) != Some(3) {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(json!({
        "status": "approved",
        "consent_id": format!("consent-{}", body["client_id"].as_str().unwrap_or_default()),
        "auto_approved": false
    })))
}

async fn transactions(
    Path(account_id): Path<String>,
    Query(query): Query<std::collections::HashMap<String, String>>,
) -> Json<Value> {
    Json(json!({
        "data": [{
            "transaction_id": format!("{account_id}-{}-{}",
                query.get("page").cloned().unwrap_or_default(),
                query.get("limit").cloned().unwrap_or_default()),
            "amount": "12.50",
            "currency": "RUB",
            "credit_debit_indicator": "debit",
            "status": "booked",
            "booking_date_time": "2025-11-01T10:00:00Z",
            "value_date_time": "2025-11-01T10:00:00Z"
        }],
        "links": {"self": "/accounts/a/transactions"},
        "meta": {"total_pages": 1}
    }))
}

async fn spawn_stub() -> (String, Stub) {
    let stub = Stub::default();
    let app = Router::new()
        .route("/api/auth/bank-token", post(bank_token))
        .route("/api/account-consents/request", post(consent))
        .route("/api/accounts/{id}/transactions", get(transactions))
        .route(
            "/api/accounts",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        )
        .with_state(stub.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), stub)
}

#[tokio::test]
async fn consent_reuses_cached_bank_token() {
    let (base_url, stub) = spawn_stub().await;
    let client = VBankClient::new(&base_url, "team", "secret").unwrap();

    let first = client.create_consent("c-1", "team", "Team Bank").await.unwrap();
    let second = client.create_consent("c-2", "team", "Team Bank").await.unwrap();

    assert_eq!(first.consent_id, "consent-c-1");
    assert_eq!(second.consent_id, "consent-c-2");
    assert_eq!(stub.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn wrong_secret_surfaces_api_error() {
    let (base_url, _stub) = spawn_stub().await;
    let client = VBankClient::new(&base_url, "team", "oops").unwrap();

    let err = client.bank_token().await.unwrap_err();
    assert!(matches!(err, VBankError::Api { status: 401, .. }));
}

#[tokio::test]
async fn transactions_forward_paging() {
    let (base_url, _stub) = spawn_stub().await;
    let client = VBankClient::new(&base_url, "team", "secret").unwrap();

    let page = client
        .transactions("client-token", "acc-9", Some(2), Some(50))
        .await
        .unwrap();
    assert_eq!(page.data[0].transaction_id, "acc-9-2-50");
    assert_eq!(page.meta.total_pages, 1);

    let unpaged = client
        .transactions("client-token", "acc-9", None, Some(0))
        .await
        .unwrap();
    assert_eq!(unpaged.data[0].transaction_id, "acc-9--");
}

#[tokio::test]
async fn error_body_is_kept() {
    let (base_url, _stub) = spawn_stub().await;
    let client = VBankClient::new(&base_url, "team", "secret").unwrap();

    match client.accounts("client-token").await {
        Err(VBankError::Api { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
