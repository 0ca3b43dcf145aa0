use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::Authorization;
use headers::authorization::Bearer;
use std::sync::Arc;

use crate::db::models::{Role, UserId};
use crate::error::BridgeError;
use crate::service::auth::TokenKeys;

/// Caller identity taken from a valid `Authorization: Bearer <jwt>` header.
/// Adding this extractor to a handler makes the route require login.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<TokenKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = BridgeError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| BridgeError::MissingToken)?;

        let keys = Arc::<TokenKeys>::from_ref(state);
        let claims = keys.verify(bearer.token())?;
        Ok(Self {
            id: claims.user_id()?,
            username: claims.username,
            role: claims.role,
        })
    }
}
