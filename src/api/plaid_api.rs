use crate::config::Config;
use crate::error::{BridgeError, PlaidError};
use crate::types::plaid::{
    AccessTokenRequest, AccountsGetResponse, AuthGetResponse, LinkTokenCreateRequest,
    LinkTokenCreateResponse, LinkTokenUser, PaymentCreateRequest, PaymentCreateResponse,
    PublicTokenExchangeRequest, PublicTokenExchangeResponse, TransactionsGetRequest,
    TransactionsGetResponse,
};
use backon::{ExponentialBuilder, Retryable};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

/// Plaid JSON API client. Credentials travel as headers on every call.
pub struct PlaidApi {
    client: reqwest::Client,
    base_url: Url,
    client_id: String,
    secret: String,
    client_name: String,
    products: Vec<String>,
    webhook: Option<String>,
    redirect_uri: Option<String>,
}

impl PlaidApi {
    pub fn new(client: reqwest::Client, cfg: &Config) -> Result<Self, BridgeError> {
        Ok(Self {
            client,
            base_url: cfg.plaid_base_url()?,
            client_id: cfg.plaid_client_id.clone(),
            secret: cfg.plaid_secret.clone(),
            client_name: cfg.plaid_client_name.clone(),
            products: cfg.plaid_products.clone(),
            webhook: cfg.plaid_webhook_url.clone(),
            redirect_uri: cfg.plaid_redirect_uri.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send<B, R>(&self, url: Url, body: &B) -> Result<R, BridgeError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let resp = self
            .client
            .post(url)
            .header("PLAID-CLIENT-ID", &self.client_id)
            .header("PLAID-SECRET", &self.secret)
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Idempotent reads; retried on 5xx and transport errors.
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, BridgeError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;

        (|| async { self.send(url.clone(), body).await })
            .retry(default_retry_policy())
            .when(|e: &BridgeError| e.is_retryable())
            .notify(|err, dur: Duration| {
                warn!("Plaid {} retrying after error {}, sleeping {:?}", path, err, dur);
            })
            .await
    }

    /// Single attempt for calls with side effects (payments, token exchange).
    async fn post_once<B, R>(&self, path: &str, body: &B) -> Result<R, BridgeError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        self.send(url, body).await
    }

    async fn decode<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, BridgeError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(match PlaidError::from_body(status, &bytes) {
                Some(plaid_err) => {
                    debug!(
                        status = %status,
                        error_type = %plaid_err.error_type,
                        error_code = %plaid_err.error_code,
                        "Plaid returned an error"
                    );
                    BridgeError::PlaidServerError(plaid_err)
                }
                None => BridgeError::UpstreamStatus(status),
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// POST /link/token/create for one end user.
    pub async fn create_link_token(
        &self,
        client_user_id: impl Into<String>,
    ) -> Result<LinkTokenCreateResponse, BridgeError> {
        let req = LinkTokenCreateRequest {
            client_name: self.client_name.clone(),
            language: "en".to_string(),
            country_codes: vec!["US".to_string()],
            user: LinkTokenUser {
                client_user_id: client_user_id.into(),
            },
            products: self.products.clone(),
            webhook: self.webhook.clone(),
            redirect_uri: self.redirect_uri.clone(),
        };
        self.post("link/token/create", &req).await
    }

    pub async fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> Result<PublicTokenExchangeResponse, BridgeError> {
        self.post_once(
            "item/public_token/exchange",
            &PublicTokenExchangeRequest { public_token },
        )
        .await
    }

    /// Account and routing numbers for the item.
    pub async fn auth_get(&self, access_token: &str) -> Result<AuthGetResponse, BridgeError> {
        self.post("auth/get", &AccessTokenRequest { access_token })
            .await
    }

    pub async fn accounts_get(
        &self,
        access_token: &str,
    ) -> Result<AccountsGetResponse, BridgeError> {
        self.post("accounts/get", &AccessTokenRequest { access_token })
            .await
    }

    pub async fn transactions_get(
        &self,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TransactionsGetResponse, BridgeError> {
        let req = TransactionsGetRequest {
            access_token,
            start_date: start_date.format("%Y-%m-%d").to_string(),
            end_date: end_date.format("%Y-%m-%d").to_string(),
        };
        self.post("transactions/get", &req).await
    }

    pub async fn create_payment(
        &self,
        payment: &PaymentCreateRequest,
    ) -> Result<PaymentCreateResponse, BridgeError> {
        self.post_once("payment_initiation/payment/create", payment)
            .await
    }
}
