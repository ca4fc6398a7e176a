mod config;
mod error;
mod routes;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use analysis_core::reference::ReferenceTable;

use config::Config;
use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("starting analysis server");

    // 1. Load config from environment (validates the reference file path)
    let config = Config::from_env()?;
    info!(
        reference = %config.reference_path.display(),
        addr = %config.listen_addr,
        "configuration loaded"
    );

    // 2. Load the reference catalog once; missing or unreadable is fatal
    //    before any request is accepted
    let reference = ReferenceTable::load(&config.reference_path)?;
    info!(entries = reference.len(), "reference catalog loaded");

    // 3. Build the router and serve
    let state = AppState {
        reference: Arc::new(reference),
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
