//! Request and response bodies of the Plaid endpoints the bridge calls.
//! Account and transaction objects are passed through untouched as JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct LinkTokenUser {
    pub client_user_id: String,
}

#[derive(Debug, Serialize)]
pub struct LinkTokenCreateRequest {
    pub client_name: String,
    pub language: String,
    pub country_codes: Vec<String>,
    pub user: LinkTokenUser,
    pub products: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTokenCreateResponse {
    pub link_token: String,
    #[serde(default)]
    pub expiration: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublicTokenExchangeRequest<'a> {
    pub public_token: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicTokenExchangeResponse {
    pub access_token: String,
    pub item_id: String,
}

/// Body shared by the endpoints that only take an access token.
#[derive(Debug, Serialize)]
pub struct AccessTokenRequest<'a> {
    pub access_token: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthNumbers {
    #[serde(default)]
    pub ach: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthGetResponse {
    #[serde(default)]
    pub accounts: Vec<Value>,
    #[serde(default)]
    pub numbers: AuthNumbers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsGetResponse {
    pub accounts: Vec<Value>,
    #[serde(default)]
    pub item: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct TransactionsGetRequest<'a> {
    pub access_token: &'a str,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsGetResponse {
    pub transactions: Vec<Value>,
    #[serde(default)]
    pub total_transactions: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentAmount {
    pub currency: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentCreateRequest {
    pub recipient_id: String,
    pub reference: String,
    pub amount: PaymentAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreateResponse {
    pub payment_id: String,
    pub status: String,
    #[serde(default)]
    pub request_id: Option<String>,
}
