use std::sync::Arc;

use tracing::info;

use depth_monitor::api;
use depth_monitor::config::Config;
use depth_monitor::data_sources::build_clients;
use depth_monitor::summary::Collector;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!(
        pairs = ?config.pairs,
        exchanges = ?config.exchanges,
        max_workers = config.max_workers,
        "starting depth monitor"
    );

    let clients = build_clients(&config.exchanges, config.request_timeout)?;
    let collector = Arc::new(Collector::new(clients, config.collector()));

    api::serve(&config, collector).await?;

    Ok(())
}
