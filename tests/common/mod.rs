#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

use plaidbridge::config::Config;
use plaidbridge::router::{BridgeState, bridge_router};

pub const BOUNDARY: &str = "plaidbridge-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: BridgeState,
    pub root: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut dir = std::env::temp_dir();
    dir.push(format!("plaidbridge-{tag}-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Config pointing at a fresh SQLite file and upload folder.
pub fn test_config(tag: &str) -> (Config, PathBuf) {
    let root = scratch_dir(tag);
    let cfg = Config {
        database_url: format!("sqlite:{}", root.join("bridge.sqlite").display()),
        upload_folder: root.join("uploads"),
        jwt_secret_key: "test-secret".to_string(),
        rate_limit_per_hour: 10_000,
        plaid_client_id: "client".to_string(),
        plaid_secret: "secret".to_string(),
        ..Config::default()
    };
    (cfg, root)
}

pub async fn spawn_app_with(tag: &str, tweak: impl FnOnce(&mut Config)) -> TestApp {
    let (mut cfg, root) = test_config(tag);
    tweak(&mut cfg);
    let state = BridgeState::build(cfg).await.expect("build state");
    TestApp {
        router: bridge_router(state.clone()),
        state,
        root,
    }
}

pub async fn spawn_app(tag: &str) -> TestApp {
    spawn_app_with(tag, |_| {}).await
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(req).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn send_raw(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = self.router.clone().oneshot(req).await.expect("oneshot");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, bytes.to_vec())
    }

    /// Register then log in; returns (user id, bearer token).
    pub async fn signup(&self, username: &str, role: &str) -> (i64, String) {
        let (status, body) = self
            .send(json_request(
                "POST",
                "/api/register",
                None,
                json!({ "username": username, "password": "pw-123456", "role": role }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
        let user_id = body["user_id"].as_i64().expect("user_id");

        let (status, body) = self
            .send(json_request(
                "POST",
                "/api/login",
                None,
                json!({ "username": username, "password": "pw-123456" }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login {username}: {body}");
        let token = body["access_token"].as_str().expect("token").to_string();
        (user_id, token)
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("build request")
}

/// Single-field multipart upload.
pub fn multipart_request(
    uri: &str,
    token: &str,
    field: &str,
    filename: &str,
    content: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .expect("build request")
}
