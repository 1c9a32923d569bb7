use std::error::Error;
use std::time::Duration;

use tracing::{info, warn};

mod print_snapshot_table;
mod snapshot;

use print_snapshot_table::print_snapshot_as_tables;
use snapshot::{Record, Settings};

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

async fn fetch_settings(
    http: &reqwest::Client,
    server_url: &str,
) -> Result<Settings, reqwest::Error> {
    http.get(format!("{}/api/config", server_url))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

async fn fetch_snapshot(
    http: &reqwest::Client,
    server_url: &str,
) -> Result<Vec<Record>, reqwest::Error> {
    http.get(format!("{}/api/data", server_url))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

async fn print_snapshots(
    http: &reqwest::Client,
    server_url: &str,
) -> Result<(), Box<dyn Error>> {
    let settings = fetch_settings(http, server_url).await?;
    info!(?settings, "connected to {}", server_url);

    let period = Duration::from_millis(settings.refresh_interval_ms.max(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match fetch_snapshot(http, server_url).await {
            Ok(records) => print_snapshot_as_tables(&records, &settings),
            // keep polling, the server may be mid-restart
            Err(error) => warn!(%error, "failed to fetch snapshot"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let server_url =
        std::env::var("SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
    let server_url = server_url.trim_end_matches('/');
    let http = reqwest::Client::new();

    tokio::select! {
        result = print_snapshots(&http, server_url) => result?,
        _ = tokio::signal::ctrl_c() => info!("stopped"),
    }

    Ok(())
}
