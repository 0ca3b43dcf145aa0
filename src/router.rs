use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::api::{PlaidApi, TreasuryPrimeApi, build_http_client};
use crate::config::Config;
use crate::db::BridgeStorage;
use crate::error::BridgeError;
use crate::handlers::{auth, loans, plaid, statements, system, todos, transactions};
use crate::middleware::{IpRateLimiter, build_limiter, rate_limit};
use crate::service::auth::TokenKeys;
use crate::service::ledger_actor::{self, LedgerHandle};
use crate::service::screening::Screening;

#[derive(Clone)]
pub struct BridgeState {
    pub storage: BridgeStorage,
    pub ledger: LedgerHandle,
    pub plaid: Arc<PlaidApi>,
    pub treasury: Option<Arc<TreasuryPrimeApi>>,
    pub tokens: Arc<TokenKeys>,
    pub screening: Arc<Screening>,
    pub limiter: Arc<IpRateLimiter>,
    pub config: Arc<Config>,
}

impl FromRef<BridgeState> for Arc<TokenKeys> {
    fn from_ref(state: &BridgeState) -> Self {
        state.tokens.clone()
    }
}

impl BridgeState {
    /// Open storage, start the ledger actor and build the upstream clients.
    pub async fn build(cfg: Config) -> Result<Self, BridgeError> {
        let storage = BridgeStorage::connect(&cfg.database_url).await?;
        let ledger = ledger_actor::spawn(storage.clone(), cfg.global_reserve).await?;

        tokio::fs::create_dir_all(&cfg.upload_folder).await?;

        let client = build_http_client(&cfg)?;
        let plaid = Arc::new(PlaidApi::new(client.clone(), &cfg)?);
        let treasury = match (&cfg.treasury_prime_api_url, &cfg.treasury_prime_api_key) {
            (Some(url), Some(key)) if cfg.treasury_prime_configured() => Some(Arc::new(
                TreasuryPrimeApi::new(client, url.clone(), key.clone()),
            )),
            _ => None,
        };
        info!(
            plaid = %plaid.base_url(),
            treasury_prime = treasury.is_some(),
            "upstream clients ready"
        );

        Ok(Self {
            storage,
            ledger,
            plaid,
            treasury,
            tokens: Arc::new(TokenKeys::new(
                &cfg.jwt_secret_key,
                cfg.jwt_access_token_expires,
            )),
            screening: Arc::new(Screening::new(cfg.fraud_amount_threshold)),
            limiter: build_limiter(cfg.rate_limit_per_hour),
            config: Arc::new(cfg),
        })
    }
}

pub fn bridge_router(state: BridgeState) -> Router {
    let body_limit = state.config.max_content_length;

    let limited = Router::new()
        .route("/", get(system::index))
        .route("/config", get(system::config))
        .route("/global_balance", get(system::global_balance))
        .route("/account-info", get(system::account_info))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route(
            "/api/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/loan_agreements", get(loans::list).post(loans::create))
        .route("/review_agreement", post(loans::review_agreement))
        .route("/compliance_report", get(loans::compliance_report))
        .route("/validate_transaction", post(loans::validate_transaction))
        .route("/execute_contract/{id}", post(loans::execute_contract))
        .route("/upload-pdf", post(statements::upload_pdf))
        .route("/upload-csv", post(statements::upload_csv))
        .route("/statements/export.csv", get(statements::export_csv))
        .route("/statements/export.pdf", get(statements::export_pdf))
        .route("/create_link_token", post(plaid::create_link_token))
        .route("/generate_link_token", get(plaid::create_link_token))
        .route("/exchange_public_token", post(plaid::exchange_public_token))
        .route("/accounts", get(plaid::accounts))
        .route("/plaid/transactions", get(plaid::transactions))
        .route("/payment_initiation", post(plaid::payment_initiation))
        .route("/verify-account", post(plaid::verify_account))
        .route("/todos", get(todos::list).post(todos::create))
        .route("/todos/{id}", patch(todos::update).delete(todos::delete))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit,
        ));

    Router::new()
        .route("/health", get(system::health))
        .merge(limited)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
