use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::middleware::AuthUser;
use crate::{BridgeError, router::BridgeState};

pub async fn index() -> Json<Value> {
    Json(json!({ "message": "Welcome to PlaidBridge Open Banking API" }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn config(State(state): State<BridgeState>) -> Json<Value> {
    Json(json!({
        "PLATFORM": state.config.platform,
        "VERSION": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn global_balance(
    State(state): State<BridgeState>,
    _user: AuthUser,
) -> Result<Json<Value>, BridgeError> {
    let balance = state.ledger.balance().await?;
    Ok(Json(json!({ "global_balance": balance })))
}

pub async fn account_info(
    State(state): State<BridgeState>,
    user: AuthUser,
) -> Result<Json<Value>, BridgeError> {
    let balance = state.storage.user_balance(user.id).await?;
    let global_balance = state.ledger.balance().await?;
    Ok(Json(json!({
        "user_id": user.id,
        "username": user.username,
        "role": user.role,
        "balance": balance,
        "global_balance": global_balance,
    })))
}
