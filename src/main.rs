use std::sync::Arc;

use anyhow::Result;
use surgeboard::api::AppState;
use surgeboard::{PhqClient, SurgeboardConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = SurgeboardConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    if !config.has_token() {
        tracing::warn!(
            "No events API token configured; the dashboard will serve a warning state. \
             Set SURGEBOARD__API__TOKEN or PREDICTHQ_API_TOKEN to enable data views."
        );
    }

    let client = PhqClient::new(&config)?;
    let state = Arc::new(AppState { client, config });

    surgeboard::web::run(state).await
}
