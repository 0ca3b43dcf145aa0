use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::db::models::{DbLoanAgreement, UserId};
use crate::middleware::{AuthUser, JsonBody};
use crate::service::screening::ComplianceVerdict;
use crate::{BridgeError, router::BridgeState};

#[derive(Debug, Deserialize)]
pub struct NewAgreement {
    pub borrower_id: Option<UserId>,
    pub terms: Option<String>,
}

impl NewAgreement {
    fn terms(&self) -> Result<&str, BridgeError> {
        self.terms
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BridgeError::validation("Loan terms are required"))
    }
}

pub async fn create(
    State(state): State<BridgeState>,
    user: AuthUser,
    JsonBody(body): JsonBody<NewAgreement>,
) -> Result<(StatusCode, Json<DbLoanAgreement>), BridgeError> {
    let terms = body.terms()?;
    let borrower_id = body
        .borrower_id
        .ok_or_else(|| BridgeError::validation("Borrower ID is required"))?;
    if state.storage.get_user(borrower_id).await?.is_none() {
        return Err(BridgeError::NotFound("Borrower"));
    }

    let verdict = state.screening.analyze_loan_agreement(terms);
    let loan = state
        .storage
        .create_loan(user.id, borrower_id, terms, verdict.is_flagged())
        .await?;
    info!(
        loan_id = loan.id,
        lender_id = user.id,
        borrower_id,
        ai_flagged = loan.ai_flagged,
        "loan agreement created"
    );
    Ok((StatusCode::CREATED, Json(loan)))
}

pub async fn list(
    State(state): State<BridgeState>,
    user: AuthUser,
) -> Result<Json<Vec<DbLoanAgreement>>, BridgeError> {
    Ok(Json(state.storage.list_loans_for_user(user.id).await?))
}

/// Screen terms; a flagged review counts as a violation against the borrower.
pub async fn review_agreement(
    State(state): State<BridgeState>,
    _user: AuthUser,
    JsonBody(body): JsonBody<NewAgreement>,
) -> Result<Json<ComplianceVerdict>, BridgeError> {
    // empty or missing terms screen as approved
    let terms = body.terms.as_deref().unwrap_or_default();
    let verdict = state.screening.analyze_loan_agreement(terms);

    if let (ComplianceVerdict::Flagged { reason }, Some(borrower_id)) = (&verdict, body.borrower_id)
    {
        let touched = state
            .storage
            .record_violation(borrower_id, state.config.violation_lock_threshold)
            .await?;
        let locked = touched.iter().filter(|l| l.locked).count();
        warn!(
            borrower_id,
            %reason,
            agreements = touched.len(),
            locked,
            "compliance violation recorded"
        );
    }
    Ok(Json(verdict))
}

pub async fn compliance_report(
    State(state): State<BridgeState>,
    _user: AuthUser,
) -> Result<Json<Value>, BridgeError> {
    let ids = state.storage.flagged_loan_ids().await?;
    if ids.is_empty() {
        Ok(Json(json!({ "violations": "compliant" })))
    } else {
        Ok(Json(json!({ "violations": ids })))
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionCheck {
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: f64,
}

pub async fn validate_transaction(
    State(state): State<BridgeState>,
    _user: AuthUser,
    JsonBody(body): JsonBody<TransactionCheck>,
) -> Result<Response, BridgeError> {
    let amount = body.amount;
    if state
        .screening
        .detect_fraudulent_transaction(&body.description, amount)
    {
        // no borrower given: block without locking anything
        let locked = match body.user_id {
            Some(borrower_id) => state.storage.lock_borrower(borrower_id).await?,
            None => 0,
        };
        warn!(borrower_id = ?body.user_id, amount, locked, "fraudulent transaction blocked");
        let body = json!({
            "status": "locked",
            "message": "Transaction blocked due to fraud.",
        });
        return Ok((StatusCode::FORBIDDEN, Json(body)).into_response());
    }
    Ok(Json(json!({ "fraudulent": false })).into_response())
}

pub async fn execute_contract(
    State(state): State<BridgeState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, BridgeError> {
    // Only a party to the agreement, or an admin, may execute it.
    let party = state
        .storage
        .get_loan(id)
        .await?
        .is_some_and(|l| user.is_admin() || l.lender_id == user.id || l.borrower_id == user.id);

    let executed = if party {
        state.storage.execute_contract(id).await?
    } else {
        None
    };

    match executed {
        Some(loan) => {
            info!(loan_id = loan.id, user_id = user.id, "contract executed");
            Ok(Json(json!({
                "contract_status": "executed",
                "loan_agreement_id": loan.id,
            })))
        }
        None => Ok(Json(json!({
            "contract_status": "failed",
            "reason": "Invalid agreement or status.",
        }))),
    }
}
