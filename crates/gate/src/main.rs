//! Authgate server binary

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use authgate::{routes, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("authgate=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;
    if config.secret.is_none() {
        tracing::warn!("AUTH_SECRET is not set; all non-exempt requests will be denied");
    }

    let state = AppState::new(&config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    tracing::info!(address = %config.bind_address, mode = ?config.mode, "authgate listening");

    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
