use anyhow::Context;
use tracing_subscriber::EnvFilter;

use volleytrack::config::AppConfig;
use volleytrack::database::connection::connect;
use volleytrack::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("volleytrack=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let store = connect(&config).await.context("connecting to the store")?;
    let addr = config.bind_addr();

    let app = volleytrack::build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("🚀 Server starting on {}", addr);

    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
