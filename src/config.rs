use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::LazyLock;
use url::Url;

/// Flat environment variable names accepted without the `PLAIDBRIDGE_` prefix.
const LEGACY_ENV_KEYS: &[&str] = &[
    "PORT",
    "DATABASE_URL",
    "LOG_LEVEL",
    "JWT_SECRET_KEY",
    "JWT_ACCESS_TOKEN_EXPIRES",
    "PLAID_CLIENT_ID",
    "PLAID_SECRET",
    "PLAID_ENV",
    "PLAID_BASE_URL",
    "PLAID_WEBHOOK_URL",
    "PLAID_REDIRECT_URI",
    "TREASURY_PRIME_API_URL",
    "TREASURY_PRIME_API_KEY",
    "UPLOAD_FOLDER",
    "MAX_CONTENT_LENGTH",
    "PLATFORM",
    "PROXY",
];

pub const DEFAULT_JWT_SECRET: &str = "supersecretkey";

/// Plaid deployment the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaidEnv {
    Sandbox,
    Development,
    Production,
}

impl PlaidEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaidEnv::Sandbox => "sandbox",
            PlaidEnv::Development => "development",
            PlaidEnv::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub log_level: String,
    pub platform: String,
    pub proxy: Option<Url>,

    pub jwt_secret_key: String,
    /// Access token lifetime in seconds.
    pub jwt_access_token_expires: i64,

    pub plaid_client_id: String,
    pub plaid_secret: String,
    pub plaid_env: PlaidEnv,
    /// Overrides `https://{plaid_env}.plaid.com`.
    pub plaid_base_url: Option<Url>,
    pub plaid_client_name: String,
    pub plaid_products: Vec<String>,
    pub plaid_webhook_url: Option<String>,
    pub plaid_redirect_uri: Option<String>,

    pub treasury_prime_api_url: Option<Url>,
    pub treasury_prime_api_key: Option<String>,

    pub upload_folder: PathBuf,
    /// Request body cap in bytes.
    pub max_content_length: usize,
    pub rate_limit_per_hour: u32,

    pub global_reserve: f64,
    pub fraud_amount_threshold: f64,
    pub violation_lock_threshold: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            database_url: "sqlite://plaidbridge.db".to_string(),
            log_level: "info".to_string(),
            platform: "development".to_string(),
            proxy: None,
            jwt_secret_key: DEFAULT_JWT_SECRET.to_string(),
            jwt_access_token_expires: 3600,
            plaid_client_id: String::new(),
            plaid_secret: String::new(),
            plaid_env: PlaidEnv::Sandbox,
            plaid_base_url: None,
            plaid_client_name: "PlaidBridge Open Banking API".to_string(),
            plaid_products: vec!["auth".to_string(), "transactions".to_string()],
            plaid_webhook_url: None,
            plaid_redirect_uri: None,
            treasury_prime_api_url: None,
            treasury_prime_api_key: None,
            upload_folder: PathBuf::from("uploads"),
            max_content_length: 16 * 1024 * 1024,
            rate_limit_per_hour: 50,
            global_reserve: 1_000_000.00,
            fraud_amount_threshold: 5000.0,
            violation_lock_threshold: 3,
        }
    }
}

impl Config {
    /// Defaults, then `config.toml`, then legacy env names, then `PLAIDBRIDGE_*`.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::raw().only(LEGACY_ENV_KEYS))
            .merge(Env::prefixed("PLAIDBRIDGE_"))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn plaid_base_url(&self) -> Result<Url, url::ParseError> {
        match self.plaid_base_url.clone() {
            Some(url) => Ok(url),
            None => Url::parse(&format!("https://{}.plaid.com", self.plaid_env.as_str())),
        }
    }

    pub fn treasury_prime_configured(&self) -> bool {
        self.treasury_prime_api_url.is_some()
            && self
                .treasury_prime_api_key
                .as_deref()
                .is_some_and(|k| !k.is_empty())
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|e| panic!("FATAL: invalid configuration: {e}"))
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_deployment() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.max_content_length, 16 * 1024 * 1024);
        assert_eq!(cfg.plaid_env, PlaidEnv::Sandbox);
        assert_eq!(
            cfg.plaid_base_url().unwrap().as_str(),
            "https://sandbox.plaid.com/"
        );
    }

    #[test]
    fn figment_reads_legacy_and_prefixed_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PLAID_ENV", "development");
            jail.set_env("PORT", "8080");
            jail.set_env("PLAIDBRIDGE_RATE_LIMIT_PER_HOUR", "7");
            let cfg: Config = Config::figment().extract()?;
            assert_eq!(cfg.plaid_env, PlaidEnv::Development);
            assert_eq!(cfg.port, 8080);
            assert_eq!(cfg.rate_limit_per_hour, 7);
            assert_eq!(
                cfg.plaid_base_url().unwrap().as_str(),
                "https://development.plaid.com/"
            );
            Ok(())
        });
    }

    #[test]
    fn treasury_prime_requires_url_and_key() {
        let mut cfg = Config::default();
        assert!(!cfg.treasury_prime_configured());
        cfg.treasury_prime_api_url = Url::parse("https://api.treasuryprime.com").ok();
        assert!(!cfg.treasury_prime_configured());
        cfg.treasury_prime_api_key = Some("key".into());
        assert!(cfg.treasury_prime_configured());
    }
}
