use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::db::models::LinkedItem;
use crate::middleware::{AuthUser, JsonBody};
use crate::types::plaid::{
    AccountsGetResponse, LinkTokenCreateResponse, PaymentCreateRequest, PaymentCreateResponse,
    TransactionsGetResponse,
};
use crate::{BridgeError, router::BridgeState};

const DEFAULT_WINDOW_DAYS: i64 = 30;

async fn linked_item(state: &BridgeState, user: &AuthUser) -> Result<LinkedItem, BridgeError> {
    state
        .storage
        .get_linked_item(user.id)
        .await?
        .ok_or(BridgeError::NoLinkedItem)
}

fn note_relink(user: &AuthUser, item: &LinkedItem, err: &BridgeError) {
    if let BridgeError::PlaidServerError(e) = err
        && e.requires_relink()
    {
        warn!(user_id = user.id, item_id = %item.item_id, "plaid item needs relinking");
    }
}

pub async fn create_link_token(
    State(state): State<BridgeState>,
    user: AuthUser,
) -> Result<Json<LinkTokenCreateResponse>, BridgeError> {
    let token = state.plaid.create_link_token(user.id.to_string()).await?;
    info!(user_id = user.id, "link token created");
    Ok(Json(token))
}

#[derive(Debug, Deserialize)]
pub struct ExchangeBody {
    pub public_token: Option<String>,
}

pub async fn exchange_public_token(
    State(state): State<BridgeState>,
    user: AuthUser,
    JsonBody(body): JsonBody<ExchangeBody>,
) -> Result<Json<Value>, BridgeError> {
    let public_token = body
        .public_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| BridgeError::validation("Public token is required"))?;

    let exchanged = state.plaid.exchange_public_token(&public_token).await?;

    // Items without the auth product still link; they just carry no ACH numbers.
    let ach_details = match state.plaid.auth_get(&exchanged.access_token).await {
        Ok(auth) => auth.numbers.ach,
        Err(e) => {
            warn!(user_id = user.id, item_id = %exchanged.item_id, error = %e, "auth numbers unavailable");
            Vec::new()
        }
    };

    state
        .storage
        .upsert_linked_item(
            user.id,
            &exchanged.access_token,
            &exchanged.item_id,
            &ach_details,
        )
        .await?;
    info!(user_id = user.id, item_id = %exchanged.item_id, "plaid item linked");

    Ok(Json(json!({
        "access_token": exchanged.access_token,
        "item_id": exchanged.item_id,
        "ach_details": ach_details,
    })))
}

pub async fn accounts(
    State(state): State<BridgeState>,
    user: AuthUser,
) -> Result<Json<AccountsGetResponse>, BridgeError> {
    let item = linked_item(&state, &user).await?;
    let accounts = state
        .plaid
        .accounts_get(&item.access_token)
        .await
        .inspect_err(|e| note_relink(&user, &item, e))?;
    Ok(Json(accounts))
}

#[derive(Debug, Deserialize)]
pub struct DateWindow {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn transactions(
    State(state): State<BridgeState>,
    user: AuthUser,
    Query(window): Query<DateWindow>,
) -> Result<Json<TransactionsGetResponse>, BridgeError> {
    let end = window.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start = window
        .start_date
        .unwrap_or(end - Duration::days(DEFAULT_WINDOW_DAYS));
    if start > end {
        return Err(BridgeError::validation("start_date must not be after end_date"));
    }

    let item = linked_item(&state, &user).await?;
    let txns = state
        .plaid
        .transactions_get(&item.access_token, start, end)
        .await
        .inspect_err(|e| note_relink(&user, &item, e))?;
    Ok(Json(txns))
}

pub async fn payment_initiation(
    State(state): State<BridgeState>,
    user: AuthUser,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<PaymentCreateResponse>, BridgeError> {
    let payment: PaymentCreateRequest = serde_json::from_value(body)
        .ok()
        .filter(|p: &PaymentCreateRequest| {
            !p.recipient_id.is_empty()
                && !p.reference.is_empty()
                && !p.amount.currency.is_empty()
                && p.amount.value.is_finite()
                && p.amount.value > 0.0
        })
        .ok_or_else(|| BridgeError::validation("Invalid payment_data"))?;

    let created = state.plaid.create_payment(&payment).await?;
    info!(
        user_id = user.id,
        payment_id = %created.payment_id,
        status = %created.status,
        "payment initiated"
    );
    Ok(Json(created))
}

#[derive(Debug, Deserialize)]
pub struct VerifyAccountBody {
    pub account_id: Option<String>,
}

pub async fn verify_account(
    State(state): State<BridgeState>,
    _user: AuthUser,
    JsonBody(body): JsonBody<VerifyAccountBody>,
) -> Result<Json<Value>, BridgeError> {
    let account_id = body
        .account_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| BridgeError::validation("Account ID is required"))?;
    let treasury = state
        .treasury
        .as_ref()
        .ok_or(BridgeError::NotConfigured("Treasury Prime"))?;
    Ok(Json(treasury.verify_account(&account_id).await?))
}
