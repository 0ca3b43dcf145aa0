use crate::error::BridgeError;
use serde_json::Value;
use tracing::{error, info};
use url::Url;

/// Treasury Prime ledger backend, used to verify bank accounts.
pub struct TreasuryPrimeApi {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl TreasuryPrimeApi {
    pub fn new(client: reqwest::Client, base_url: Url, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn account_url(&self, account_id: &str) -> Result<Url, BridgeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BridgeError::NotConfigured("Treasury Prime API URL"))?
            .pop_if_empty()
            .push("accounts")
            .push(account_id);
        Ok(url)
    }

    /// GET /accounts/{id}; returns the account JSON as-is.
    pub async fn verify_account(&self, account_id: &str) -> Result<Value, BridgeError> {
        let url = self.account_url(account_id)?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            error!(account_id, %status, "Treasury Prime account verification failed");
            return Err(BridgeError::UpstreamStatus(status));
        }
        let account: Value = resp.json().await?;
        info!(account_id, "Treasury Prime account verified");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_ids_are_path_escaped() {
        let api = TreasuryPrimeApi::new(
            reqwest::Client::new(),
            Url::parse("https://api.sandbox.treasuryprime.com/v1/").unwrap(),
            "key".into(),
        );
        let url = api.account_url("acct/../x").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.sandbox.treasuryprime.com/v1/accounts/acct%2F..%2Fx"
        );
    }
}
