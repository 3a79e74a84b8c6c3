// End-to-end tests across the workspace: HTTP router, auth and account
// services wired together over the in-memory stores.

use std::sync::Arc;

use account_service::AccountService;
use api_server::{router, AppState};
use auth_service::{AuthService, TokenIssuer};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::decimal::Amount;
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn create_app() -> Router {
    let tokens = TokenIssuer::new("e2e-secret", chrono::Duration::hours(1)).unwrap();
    let auth_service = AuthService::in_memory(tokens);
    auth_service.register("teller", "open-sesame").await.unwrap();

    router(
        Arc::new(AppState {
            account_service: Arc::new(AccountService::new()),
            auth_service: Arc::new(auth_service),
        }),
        tracing::Level::INFO,
    )
}

async fn call(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn balance_of(app: &Router, id: i64) -> Amount {
    let request = Request::builder()
        .uri(format!("/account/{}", id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    body["balance"].as_str().unwrap().parse().unwrap()
}

async fn open(app: &Router, number: &str, balance: &str) -> i64 {
    let (status, body) = call(
        app,
        Method::POST,
        "/account",
        json!({"first_name": "E", "last_name": "Two", "number": number, "balance": balance}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_login_then_transfer_flow() {
    let app = create_app().await;

    let (status, body) = call(&app, Method::POST, "/login", json!({"username": "teller", "password": "open-sesame"})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["token"].as_str().unwrap().is_empty());

    let source = open(&app, "E2E-S", "100").await;
    let destination = open(&app, "E2E-D", "50").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/account/transfer",
        json!({"from_account_id": source, "to_account_id": destination, "amount": "40"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(balance_of(&app, source).await, dec!(60));
    assert_eq!(balance_of(&app, destination).await, dec!(90));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_http_transfers_never_overdraw() {
    let app = create_app().await;
    let source = open(&app, "HOT", "100").await;
    let destination = open(&app, "COLD", "0").await;

    let requests = (0..30).map(|_| {
        let app = app.clone();
        tokio::spawn(async move {
            call(
                &app,
                Method::POST,
                "/account/transfer",
                json!({"from_account_id": source, "to_account_id": destination, "amount": "7"}),
            )
            .await
            .0
        })
    });
    let statuses = futures::future::join_all(requests).await;

    let accepted = statuses.iter().filter(|s| matches!(s, Ok(StatusCode::OK))).count();
    let rejected = statuses.iter().filter(|s| matches!(s, Ok(StatusCode::BAD_REQUEST))).count();
    assert_eq!(accepted, 14);
    assert_eq!(rejected, 16);

    let source_after = balance_of(&app, source).await;
    let destination_after = balance_of(&app, destination).await;
    assert_eq!(source_after, dec!(2));
    assert_eq!(source_after + destination_after, dec!(100));
}

#[tokio::test]
async fn test_deleted_account_cannot_receive_transfers() {
    let app = create_app().await;
    let source = open(&app, "LIVE", "10").await;
    let destination = open(&app, "GONE", "0").await;

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/account/{}", destination))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        "/account/transfer",
        json!({"from_account_id": source, "to_account_id": destination, "amount": "1"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "account_not_found");
    assert_eq!(balance_of(&app, source).await, dec!(10));
}
