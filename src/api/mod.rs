pub mod plaid_api;
pub mod treasury_prime;

use crate::config::Config;
use crate::error::BridgeError;
use std::time::Duration;

pub use plaid_api::PlaidApi;
pub use treasury_prime::TreasuryPrimeApi;

/// Shared outbound HTTP client for Plaid and Treasury Prime.
pub fn build_http_client(cfg: &Config) -> Result<reqwest::Client, BridgeError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("plaidbridge/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30));
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    Ok(builder.build()?)
}
