use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::db::models::Role;
use crate::middleware::JsonBody;
use crate::service::auth::{hash_password, verify_password};
use crate::{BridgeError, router::BridgeState};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl Credentials {
    fn require(self) -> Result<(String, String, Option<Role>), BridgeError> {
        let username = self
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let password = self.password.filter(|p| !p.is_empty());
        match (username, password) {
            (Some(u), Some(p)) => Ok((u, p, self.role)),
            _ => Err(BridgeError::validation("Missing username or password")),
        }
    }
}

pub async fn register(
    State(state): State<BridgeState>,
    JsonBody(body): JsonBody<Credentials>,
) -> Result<(StatusCode, Json<Value>), BridgeError> {
    let (username, password, role) = body.require()?;
    let role = role.unwrap_or_default();
    if role == Role::Admin {
        return Err(BridgeError::validation("Role not allowed"));
    }

    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| BridgeError::PasswordHash(e.to_string()))??;
    let user = state.storage.create_user(&username, &hash, role).await?;

    info!(user_id = user.id, username = %user.username, role = ?user.role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "User created", "user_id": user.id })),
    ))
}

pub async fn login(
    State(state): State<BridgeState>,
    JsonBody(body): JsonBody<Credentials>,
) -> Result<Json<Value>, BridgeError> {
    let (username, password, _) = body.require()?;
    let Some(user) = state.storage.find_user_by_username(&username).await? else {
        warn!(%username, "login for unknown user");
        return Err(BridgeError::InvalidCredentials);
    };

    let stored = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| BridgeError::PasswordHash(e.to_string()))?;
    if !ok {
        warn!(user_id = user.id, "login with wrong password");
        return Err(BridgeError::InvalidCredentials);
    }

    let token = state.tokens.issue(&user)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(json!({ "access_token": token })))
}
