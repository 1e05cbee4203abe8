use std::net::SocketAddr;

use service_ledger::config::load_config;
use service_ledger::{create_router, initialize_backend};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if config.uses_insecure_secret() {
        warn!("Running with the built-in JWT secret; set SERVICE_LEDGER_JWT_SECRET before exposing this server");
    }

    let app_state = initialize_backend(&config).await?;
    let app = create_router(app_state, &config.server.cors_origins);

    let addr: SocketAddr = config.server.bind_address.parse()?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
