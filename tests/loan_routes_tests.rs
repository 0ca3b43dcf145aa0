mod common;

use axum::http::StatusCode;
use common::{get, json_request, spawn_app};
use serde_json::json;

#[tokio::test]
async fn agreements_are_screened_and_listed_for_both_parties() {
    let app = spawn_app("loans-create").await;
    let (lender_id, lender) = app.signup("lender", "lender").await;
    let (borrower_id, borrower) = app.signup("borrower", "borrower").await;

    let (status, loan) = app
        .send(json_request(
            "POST",
            "/loan_agreements",
            Some(&lender),
            json!({ "borrower_id": borrower_id, "terms": "Includes Hidden Fees on renewal" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["lender_id"], lender_id);
    assert_eq!(loan["status"], "active");
    assert_eq!(loan["ai_flagged"], true);

    let (status, list) = app.send(get("/loan_agreements", Some(&borrower))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/loan_agreements",
            Some(&lender),
            json!({ "borrower_id": 9999, "terms": "fair terms" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_violations_lock_and_block_execution() {
    let app = spawn_app("loans-review").await;
    let (_, lender) = app.signup("lender", "lender").await;
    let (borrower_id, _) = app.signup("borrower", "borrower").await;

    let (_, loan) = app
        .send(json_request(
            "POST",
            "/loan_agreements",
            Some(&lender),
            json!({ "borrower_id": borrower_id, "terms": "fixed 5% APR" }),
        ))
        .await;
    let loan_id = loan["id"].as_i64().unwrap();

    let (_, report) = app.send(get("/compliance_report", Some(&lender))).await;
    assert_eq!(report, json!({ "violations": "compliant" }));

    for _ in 0..3 {
        let (status, verdict) = app
            .send(json_request(
                "POST",
                "/review_agreement",
                Some(&lender),
                json!({ "borrower_id": borrower_id, "terms": "predatory interest rates apply" }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(verdict["status"], "flagged");
        assert_eq!(
            verdict["reason"],
            "Contains unethical term: predatory interest rates"
        );
    }

    let (_, report) = app.send(get("/compliance_report", Some(&lender))).await;
    assert_eq!(report, json!({ "violations": [loan_id] }));

    let (_, body) = app
        .send(json_request(
            "POST",
            &format!("/execute_contract/{loan_id}"),
            Some(&lender),
            json!({}),
        ))
        .await;
    assert_eq!(body["contract_status"], "failed");
    assert_eq!(body["reason"], "Invalid agreement or status.");
}

#[tokio::test]
async fn approved_review_and_contract_execution() {
    let app = spawn_app("loans-execute").await;
    let (_, lender) = app.signup("lender", "lender").await;
    let (borrower_id, _) = app.signup("borrower", "borrower").await;
    let (_, outsider) = app.signup("outsider", "user").await;

    let (_, verdict) = app
        .send(json_request(
            "POST",
            "/review_agreement",
            Some(&lender),
            json!({ "borrower_id": borrower_id, "terms": "fixed 5% APR" }),
        ))
        .await;
    assert_eq!(verdict, json!({ "status": "approved" }));

    let (_, loan) = app
        .send(json_request(
            "POST",
            "/loan_agreements",
            Some(&lender),
            json!({ "borrower_id": borrower_id, "terms": "fixed 5% APR" }),
        ))
        .await;
    let uri = format!("/execute_contract/{}", loan["id"]);

    let (_, body) = app
        .send(json_request("POST", &uri, Some(&outsider), json!({})))
        .await;
    assert_eq!(body["contract_status"], "failed");

    let (_, body) = app
        .send(json_request("POST", &uri, Some(&lender), json!({})))
        .await;
    assert_eq!(body["contract_status"], "executed");
    assert_eq!(body["loan_agreement_id"], loan["id"]);

    // already under contract
    let (_, body) = app
        .send(json_request("POST", &uri, Some(&lender), json!({})))
        .await;
    assert_eq!(body["contract_status"], "failed");
}

#[tokio::test]
async fn fraudulent_transaction_locks_borrower_agreements() {
    let app = spawn_app("loans-fraud").await;
    let (_, lender) = app.signup("lender", "lender").await;
    let (borrower_id, _) = app.signup("borrower", "borrower").await;

    let (_, loan) = app
        .send(json_request(
            "POST",
            "/loan_agreements",
            Some(&lender),
            json!({ "borrower_id": borrower_id, "terms": "fixed 5% APR" }),
        ))
        .await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/validate_transaction",
            Some(&lender),
            json!({ "user_id": borrower_id, "description": "groceries", "amount": 120.0 }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "fraudulent": false }));

    let (status, body) = app
        .send(json_request(
            "POST",
            "/validate_transaction",
            Some(&lender),
            json!({ "user_id": borrower_id, "description": "Account drained overnight", "amount": 10.0 }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "locked");
    assert_eq!(body["message"], "Transaction blocked due to fraud.");

    let stored = app
        .state
        .storage
        .get_loan(loan["id"].as_i64().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.locked);
}

#[tokio::test]
async fn screening_routes_accept_sparse_bodies() {
    let app = spawn_app("loans-sparse").await;
    let (_, token) = app.signup("lender", "lender").await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/validate_transaction",
            Some(&token),
            json!({ "description": "account drained" }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "locked");

    let (status, body) = app
        .send(json_request(
            "POST",
            "/validate_transaction",
            Some(&token),
            json!({ "amount": 6000.0 }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "locked");

    let (status, body) = app
        .send(json_request(
            "POST",
            "/validate_transaction",
            Some(&token),
            json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "fraudulent": false }));

    let (status, body) = app
        .send(json_request(
            "POST",
            "/review_agreement",
            Some(&token),
            json!({ "borrower_id": 1 }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "approved" }));

    // creation still needs terms
    let (status, _) = app
        .send(json_request(
            "POST",
            "/loan_agreements",
            Some(&token),
            json!({ "borrower_id": 1 }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
