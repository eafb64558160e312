use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, Money, NewLoanCmd, SplitSpec};
use migration::MigratorTrait;
use server::{ServerState, router};
use uuid::Uuid;
use vbank::MockClient;

struct TestApp {
    router: Router,
    alice: Uuid,
    bob: Uuid,
    loan_id: i64,
    split_ids: Vec<i64>,
}

async fn app() -> TestApp {
    app_with_bank(true).await
}

async fn app_with_bank(with_bank: bool) -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();

    engine.new_bank(1, "ABank").await.unwrap();
    engine.new_bank(2, "SBank").await.unwrap();
    let alice = engine
        .new_user("alice@example.com", "Alice", None, "password")
        .await
        .unwrap();
    let bob = engine
        .new_user("bob@example.com", "Bob", None, "secret")
        .await
        .unwrap();
    engine
        .new_user("admin@example.com", "Admin", None, "root")
        .await
        .unwrap();

    let detail = engine
        .create_loan(NewLoanCmd::new(
            alice,
            Money::new(1000_00),
            vec![
                SplitSpec::new(1, Money::new(600_00)),
                SplitSpec::new(2, Money::new(400_00)),
            ],
        ))
        .await
        .unwrap();

    let mut state = ServerState::new(engine, vec!["Admin@example.com".to_string()]);
    if with_bank {
        state = state.with_bank(Arc::new(MockClient));
    }
    TestApp {
        router: router(state),
        alice,
        bob,
        loan_id: detail.loan.id,
        split_ids: detail.splits.iter().map(|s| s.id).collect(),
    }
}

fn basic(user: &str, password: &str) -> String {
    let secret = format!("{user}:{password}");
    format!(
        "Basic {}",
        base64::prelude::BASE64_STANDARD.encode(secret)
    )
}

async fn call(
    app: &TestApp,
    method: Method,
    uri: &str,
    auth: (&str, &str),
    body: Option<Value>,
) -> (StatusCode, Value) {
    call_with_headers(app, method, uri, auth, &[], body).await
}

async fn call_with_headers(
    app: &TestApp,
    method: Method,
    uri: &str,
    auth: (&str, &str),
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic(auth.0, auth.1));
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

const ALICE: (&str, &str) = ("alice@example.com", "password");
const BOB: (&str, &str) = ("bob@example.com", "secret");
const ADMIN: (&str, &str) = ("admin@example.com", "root");

#[tokio::test]
async fn wrong_credentials_are_unauthorized() {
    let app = app().await;
    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/users/{}/debt", app.alice),
        ("alice@example.com", "nope"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn loan_detail_reports_splits_as_strings() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/loans/{}", app.loan_id),
        ALICE,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remaining_debt"], "1000.00");
    assert_eq!(body["splits"][0]["split_amount"], "600.00");
    assert_eq!(body["loan"]["status"], "ACTIVE");

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/loans/{}", app.loan_id),
        BOB,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn payment_then_debt() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/loans/{}/payment", app.loan_id),
        ALICE,
        Some(json!({
            "total_amount": "300.00",
            "allocations": [
                {"split_id": app.split_ids[0], "principal_paid": "250.00", "interest_paid": "50.00"}
            ],
            "comment": null,
            "idempotency_key": "k-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_amount"], "300.00");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/users/{}/debt", app.alice),
        ALICE,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_debt"], "750.00");

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/users/{}/debt", app.alice),
        BOB,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn payment_errors_map_to_status_codes() {
    let app = app().await;
    let uri = format!("/loans/{}/payment", app.loan_id);

    let (status, body) = call(
        &app,
        Method::POST,
        &uri,
        ALICE,
        Some(json!({
            "total_amount": "300.00",
            "allocations": [
                {"split_id": app.split_ids[0], "principal_paid": "250.00", "interest_paid": "49.00"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (status, _) = call(
        &app,
        Method::POST,
        &uri,
        ALICE,
        Some(json!({
            "total_amount": "600.01",
            "allocations": [
                {"split_id": app.split_ids[0], "principal_paid": "600.01", "interest_paid": "0"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::POST,
        &uri,
        BOB,
        Some(json!({
            "total_amount": "1.00",
            "allocations": [
                {"split_id": app.split_ids[0], "principal_paid": "1.00", "interest_paid": "0"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn plan_matches_remaining_principal() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/loans/{}/plan", app.loan_id),
        ALICE,
        Some(json!({"total_amount": "100.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allocations"][0]["principal_paid"], "60.00");
    assert_eq!(body["allocations"][1]["principal_paid"], "40.00");
}

#[tokio::test]
async fn only_admins_decide_applications() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/applications",
        BOB,
        Some(json!({"bank_id": 1, "type_code": "consumer", "requested_amount": "500.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING");
    let application_id = body["id"].as_i64().unwrap();

    let approve_uri = format!("/applications/{application_id}/approve");
    let bad_splits = json!({
        "splits": [{"bank_id": 1, "amount": "300.00"}, {"bank_id": 2, "amount": "199.00"}],
        "interest_rate": "10.00"
    });
    let (status, _) = call(&app, Method::POST, &approve_uri, BOB, Some(bad_splits.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::POST, &approve_uri, ADMIN, Some(bad_splits)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = call(
        &app,
        Method::POST,
        &approve_uri,
        ADMIN,
        Some(json!({
            "splits": [{"bank_id": 1, "amount": "300.00"}, {"bank_id": 2, "amount": "200.00"}],
            "interest_rate": "10.00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["loan_id"].is_i64());

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/applications/{application_id}/reject"),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/users/{}/applications", app.bob),
        BOB,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applications"][0]["status"], "APPROVED");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/users/{}/summary", app.bob),
        BOB,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_debt"], "500.00");
    assert_eq!(body["active_loans"], 1);
}

#[tokio::test]
async fn bank_client_login_then_accounts() {
    let app = app().await;

    let (status, demo) = call(&app, Method::GET, "/banking/demo-client", ALICE, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, login) = call(
        &app,
        Method::POST,
        "/banking/login",
        ALICE,
        Some(json!({"username": demo["person_id"], "password": demo["password"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["access_token"].as_str().unwrap().to_string();

    let (status, accounts) = call_with_headers(
        &app,
        Method::GET,
        "/banking/accounts",
        ALICE,
        &[("x-vbank-token", token.as_str())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let account_id = accounts["accounts"][0]["account_id"].as_str().unwrap().to_string();

    let (status, page) = call_with_headers(
        &app,
        Method::GET,
        &format!("/banking/accounts/{account_id}/transactions?page=1&limit=10"),
        ALICE,
        &[("x-vbank-token", token.as_str())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"][0]["amount"], "1000.00");

    let (status, balances) = call_with_headers(
        &app,
        Method::GET,
        &format!("/banking/accounts/{account_id}/balances"),
        ALICE,
        &[("x-vbank-token", token.as_str())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balances["data"][0]["amount"], "5000.00");
}

#[tokio::test]
async fn bank_errors_are_reported() {
    let app = app().await;

    let (status, _) = call(&app, Method::GET, "/banking/accounts", ALICE, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/banking/login",
        ALICE,
        Some(json!({"username": "mock-pid", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("401"));

    let (status, _) = call(
        &app,
        Method::POST,
        "/banking/consent",
        ALICE,
        Some(json!({"client_id": " ", "requesting_bank": "team", "requesting_bank_name": "Team"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn consent_is_requested_through_the_bank() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/banking/consent",
        ALICE,
        Some(json!({
            "client_id": "mock-pid",
            "requesting_bank": "team",
            "requesting_bank_name": "Team Bank"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["consent_id"], "mock-consent-1");
}

#[tokio::test]
async fn banking_routes_need_a_configured_bank() {
    let app = app_with_bank(false).await;

    let (status, _) = call(&app, Method::GET, "/banking/demo-client", ALICE, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = call(
        &app,
        Method::GET,
        "/banking/demo-client",
        ("alice@example.com", "nope"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
