mod api;
mod config;
mod dto;
mod error;
mod state;
mod storage;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arbor_web=debug,arbor_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;
    tracing::info!(
        data_dir = %config.storage.data_dir.display(),
        history_capacity = config.core.history.capacity,
        "configuration loaded"
    );

    let state = AppState::new(config);
    let app = api::app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("arbor-web listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
