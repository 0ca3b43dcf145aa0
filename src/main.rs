use mimalloc::MiMalloc;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use plaidbridge::config::{CONFIG, DEFAULT_JWT_SECRET};
use plaidbridge::router::{BridgeState, bridge_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &*CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.log_level.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        plaid_env = cfg.plaid_env.as_str(),
        platform = %cfg.platform,
        loglevel = %cfg.log_level,
    );
    if cfg.jwt_secret_key == DEFAULT_JWT_SECRET {
        warn!("JWT_SECRET_KEY is the built-in default; set a real secret outside development");
    }
    if cfg.plaid_client_id.is_empty() || cfg.plaid_secret.is_empty() {
        warn!("Plaid credentials are not set; Plaid routes will fail upstream");
    }

    let state = BridgeState::build(cfg.clone()).await?;
    let app = bridge_router(state);

    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
