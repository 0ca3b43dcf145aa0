use axum::{Json, extract::State, http::StatusCode};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::db::models::{DbTransaction, NewTransaction};
use crate::middleware::{AuthUser, JsonBody};
use crate::{BridgeError, router::BridgeState};

#[derive(Debug, Deserialize)]
pub struct TransactionBody {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    pub amount: Option<f64>,
}

pub async fn list(
    State(state): State<BridgeState>,
    user: AuthUser,
) -> Result<Json<Vec<DbTransaction>>, BridgeError> {
    Ok(Json(state.storage.list_transactions(user.id).await?))
}

pub async fn create(
    State(state): State<BridgeState>,
    user: AuthUser,
    JsonBody(body): JsonBody<TransactionBody>,
) -> Result<(StatusCode, Json<DbTransaction>), BridgeError> {
    let description = body.description.trim();
    if description.is_empty() {
        return Err(BridgeError::validation("Description is required"));
    }
    let amount = body
        .amount
        .filter(|a| a.is_finite())
        .ok_or_else(|| BridgeError::validation("A numeric amount is required"))?;

    let fraudulent = state
        .screening
        .detect_fraudulent_transaction(description, amount);
    if fraudulent {
        warn!(user_id = user.id, amount, "transaction stored unverified");
    }

    let row = state
        .storage
        .insert_transaction(
            user.id,
            NewTransaction {
                date: body.date.unwrap_or_else(|| Utc::now().date_naive()),
                description: description.to_string(),
                amount,
                ai_verified: !fraudulent,
            },
        )
        .await?;
    info!(user_id = user.id, transaction_id = row.id, "transaction recorded");
    Ok((StatusCode::CREATED, Json(row)))
}
