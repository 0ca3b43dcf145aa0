mod common;

use axum::http::StatusCode;
use common::{get, json_request, spawn_app};
use serde_json::json;

#[tokio::test]
async fn register_login_and_read_account_info() {
    let app = spawn_app("auth-flow").await;
    let (user_id, token) = app.signup("alice", "borrower").await;

    let (status, body) = app.send(get("/account-info", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "borrower");
    assert_eq!(body["balance"], 0.0);
    assert_eq!(body["global_balance"], 1_000_000.0);
}

#[tokio::test]
async fn register_rejects_missing_fields_and_duplicates() {
    let app = spawn_app("auth-register").await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/register",
            None,
            json!({ "username": "bob" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Missing username or password");

    app.signup("bob", "lender").await;
    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/register",
            None,
            json!({ "username": "bob", "password": "other" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "User already exists");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = spawn_app("auth-login").await;
    app.signup("carol", "user").await;

    for creds in [
        json!({ "username": "carol", "password": "nope" }),
        json!({ "username": "nobody", "password": "pw-123456" }),
    ] {
        let (status, body) = app
            .send(json_request("POST", "/api/login", None, creds))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Invalid credentials");
    }
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() {
    let app = spawn_app("auth-guard").await;

    let (status, _) = app.send(get("/api/transactions", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send(get("/todos", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn public_system_routes() {
    let app = spawn_app("auth-system").await;

    let (status, body) = app.send(get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));

    let (status, body) = app.send(get("/config", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["PLATFORM"], "development");
    assert_eq!(body["VERSION"], env!("CARGO_PKG_VERSION"));

    let (status, body) = app.send(get("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("PlaidBridge"));
}

#[tokio::test]
async fn malformed_json_bodies_use_the_error_envelope() {
    let app = spawn_app("auth-badjson").await;

    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/register")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_BODY");
    assert!(body["error"]["message"].is_string());

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/register",
            None,
            json!({ "username": "zed", "password": "pw", "role": "superuser" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_BODY");

    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/login")
        .body(axum::body::Body::from("username=zed"))
        .unwrap();
    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"]["code"], "INVALID_BODY");
}
