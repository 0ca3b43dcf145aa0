mod common;

use axum::http::StatusCode;
use common::{get, json_request, spawn_app};
use serde_json::json;

#[tokio::test]
async fn todo_lifecycle_is_scoped_to_the_owner() {
    let app = spawn_app("todos").await;
    let (user_id, owner) = app.signup("hal", "user").await;
    let (_, other) = app.signup("ivy", "user").await;

    let (status, todo) = app
        .send(json_request(
            "POST",
            "/todos",
            Some(&owner),
            json!({ "content": "file taxes" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(todo["completed"], false);
    assert_eq!(todo["user_id"], user_id);
    let uri = format!("/todos/{}", todo["id"]);

    let (status, _) = app
        .send(json_request("POST", "/todos", Some(&owner), json!({ "content": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(json_request("PATCH", &uri, Some(&other), json!({ "completed": true })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = app
        .send(json_request("PATCH", &uri, Some(&owner), json!({ "completed": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["content"], "file taxes");

    let (_, list) = app.send(get("/todos", Some(&other))).await;
    assert_eq!(list, json!([]));

    let (status, _) = app
        .send(json_request("DELETE", &uri, Some(&owner), json!({})))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .send(json_request("DELETE", &uri, Some(&owner), json!({})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
