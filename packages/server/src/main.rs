use std::net::SocketAddr;

use tracing::{Level, info};

use server::config::AppConfig;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState::from_config(config).await?;
    let app = server::build_router(state);

    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
