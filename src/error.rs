use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum BridgeError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Missing or malformed bearer token")]
    MissingToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserExists,

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("No linked account found")]
    NoLinkedItem,

    #[error("Invalid JSON body: {0}")]
    JsonBody(#[from] axum::extract::rejection::JsonRejection),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Unreadable statement: {0}")]
    Statement(String),

    #[error("PDF rendering error: {0}")]
    PdfRender(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Too many requests")]
    RateLimited,

    #[error("Ledger actor error: {0}")]
    RactorError(String),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("Plaid API error: {0:?}")]
    PlaidServerError(PlaidError),
}

impl BridgeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BridgeError::Validation(msg.into())
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            BridgeError::DatabaseError(_)
                | BridgeError::RactorError(_)
                | BridgeError::Io(_)
                | BridgeError::Csv(_)
                | BridgeError::Json(_)
                | BridgeError::PasswordHash(_)
                | BridgeError::PdfRender(_)
        )
    }

    /// Transport failures and 5xx answers are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            BridgeError::UpstreamStatus(code) => code.is_server_error(),
            BridgeError::PlaidServerError(e) => e.status.is_server_error(),
            _ => false,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> axum::response::Response {
        if self.is_internal() {
            error!(error = %self, "internal error while serving request");
        }
        let (status, error_body) = match self {
            BridgeError::PlaidServerError(plaid_err) if plaid_err.requires_relink() => (
                plaid_err.status,
                ApiErrorBody {
                    code: "RELINK_REQUIRED".to_string(),
                    message: "Bank login expired; link the account again.".to_string(),
                },
            ),
            BridgeError::PlaidServerError(plaid_err) => {
                let body = ApiErrorBody {
                    code: plaid_err.error_code,
                    message: plaid_err
                        .display_message
                        .unwrap_or(plaid_err.error_message),
                };
                (plaid_err.status, body)
            }
            BridgeError::DatabaseError(_)
            | BridgeError::RactorError(_)
            | BridgeError::Io(_)
            | BridgeError::Csv(_)
            | BridgeError::Json(_)
            | BridgeError::PasswordHash(_)
            | BridgeError::PdfRender(_) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                };
                (status, body)
            }
            BridgeError::Jwt(_) | BridgeError::MissingToken => {
                let status = StatusCode::UNAUTHORIZED;
                let body = ApiErrorBody {
                    code: "UNAUTHORIZED".to_string(),
                    message: "Missing or invalid access token.".to_string(),
                };
                (status, body)
            }
            BridgeError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    code: "INVALID_CREDENTIALS".to_string(),
                    message: "Invalid credentials".to_string(),
                },
            ),
            BridgeError::UserExists => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "USER_EXISTS".to_string(),
                    message: "User already exists".to_string(),
                },
            ),
            BridgeError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "BAD_REQUEST".to_string(),
                    message: msg,
                },
            ),
            BridgeError::NoLinkedItem => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "NO_LINKED_ITEM".to_string(),
                    message: "No linked account found".to_string(),
                },
            ),
            BridgeError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{what} not found"),
                },
            ),
            BridgeError::JsonBody(e) => (
                e.status(),
                ApiErrorBody {
                    code: "INVALID_BODY".to_string(),
                    message: e.body_text(),
                },
            ),
            BridgeError::Multipart(e) => (
                e.status(),
                ApiErrorBody {
                    code: "BAD_MULTIPART".to_string(),
                    message: e.body_text(),
                },
            ),
            BridgeError::Statement(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiErrorBody {
                    code: "UNREADABLE_STATEMENT".to_string(),
                    message: reason,
                },
            ),
            BridgeError::NotConfigured(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiErrorBody {
                    code: "NOT_CONFIGURED".to_string(),
                    message: format!("{what} is not configured."),
                },
            ),
            BridgeError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiErrorBody {
                    code: "RATE_LIMIT".to_string(),
                    message: "Rate limit exceeded.".to_string(),
                },
            ),
            BridgeError::Reqwest(_) | BridgeError::UrlParse(_) => {
                let status = StatusCode::BAD_GATEWAY;
                let body = ApiErrorBody {
                    code: "BAD_GATEWAY".to_string(),
                    message: "Upstream service is unavailable.".to_string(),
                };
                (status, body)
            }
            BridgeError::UpstreamStatus(code) => {
                let (err_code, msg) = match code {
                    StatusCode::TOO_MANY_REQUESTS => {
                        ("RATE_LIMIT", "Upstream rate limit exceeded.")
                    }
                    StatusCode::UNAUTHORIZED => ("UNAUTHORIZED", "Upstream authentication failed."),
                    StatusCode::FORBIDDEN => ("FORBIDDEN", "Upstream permission denied."),
                    StatusCode::NOT_FOUND => ("NOT_FOUND", "Upstream resource not found."),
                    _ => ("UPSTREAM_ERROR", "An upstream error occurred."),
                };

                (
                    code,
                    ApiErrorBody {
                        code: err_code.to_string(),
                        message: msg.to_string(),
                    },
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Plaid API error body, plus the HTTP status it arrived with.
#[derive(Deserialize, Debug)]
pub struct PlaidError {
    #[serde(skip, default = "default_plaid_status")]
    pub status: StatusCode,
    pub error_type: String,
    pub error_code: String,
    pub error_message: String,
    #[serde(default)]
    pub display_message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

fn default_plaid_status() -> StatusCode {
    StatusCode::BAD_REQUEST
}

impl PlaidError {
    pub fn from_body(status: StatusCode, body: &[u8]) -> Option<Self> {
        let mut err: PlaidError = serde_json::from_slice(body).ok()?;
        err.status = status;
        Some(err)
    }

    /// Item-level failures mean the stored access token must be relinked.
    pub fn requires_relink(&self) -> bool {
        self.error_type == "ITEM_ERROR" && self.error_code == "ITEM_LOGIN_REQUIRED"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaid_error_keeps_upstream_status() {
        let body = br#"{
            "error_type": "ITEM_ERROR",
            "error_code": "ITEM_LOGIN_REQUIRED",
            "error_message": "the login details of this item have changed",
            "display_message": null,
            "request_id": "abc"
        }"#;
        let err = PlaidError::from_body(StatusCode::BAD_REQUEST, body).unwrap();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.requires_relink());

        let resp = BridgeError::PlaidServerError(err).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn server_side_plaid_errors_are_retryable() {
        let body = br#"{"error_type":"API_ERROR","error_code":"INTERNAL_SERVER_ERROR","error_message":"boom"}"#;
        let err = PlaidError::from_body(StatusCode::INTERNAL_SERVER_ERROR, body).unwrap();
        assert!(BridgeError::PlaidServerError(err).is_retryable());
        assert!(!BridgeError::InvalidCredentials.is_retryable());
    }
}
