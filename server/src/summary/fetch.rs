use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::calculate::{calculate_depth_metrics, DepthMetrics};
use super::{CollectorConfig, MetricsRecord};
use crate::data_sources::output_data_format::TradingPair;
use crate::data_sources::ExchangeClient;
use crate::error::ExchangeError;

/// One record per configured pair, in configuration order. An exchange whose
/// market list cannot be loaded contributes nothing to this cycle.
pub async fn fetch_exchange(
    client: &dyn ExchangeClient,
    config: &CollectorConfig,
) -> Vec<MetricsRecord> {
    let exchange = client.name().to_uppercase();

    let catalog = match with_timeout(config.request_timeout, client.load_markets()).await {
        Ok(catalog) => catalog,
        Err(error) => {
            warn!(exchange = %exchange, %error, "failed to load markets, skipping exchange");
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(config.pairs.len());

    for pair in &config.pairs {
        if !catalog.contains(pair) {
            debug!(exchange = %exchange, symbol = %pair, "pair not listed");
            records.push(MetricsRecord::not_listed(&exchange, pair));
            continue;
        }

        let record = match fetch_pair(client, pair, config).await {
            Ok((price, metrics)) => MetricsRecord::active(&exchange, pair, price, metrics),
            Err(error) => {
                warn!(exchange = %exchange, symbol = %pair, %error, "failed to fetch pair");
                MetricsRecord::failed(&exchange, pair, error.kind())
            }
        };
        records.push(record);
    }

    records
}

async fn fetch_pair(
    client: &dyn ExchangeClient,
    pair: &TradingPair,
    config: &CollectorConfig,
) -> Result<(f64, DepthMetrics), ExchangeError> {
    let ticker = with_timeout(config.request_timeout, client.fetch_ticker(pair)).await?;

    let price = match ticker.last {
        Some(price) if price.is_finite() && price > 0.0 => price,
        _ => {
            return Err(ExchangeError::malformed(format!(
                "ticker for {} has no last price",
                pair
            )))
        }
    };

    let order_book = with_timeout(
        config.request_timeout,
        client.fetch_order_book(pair, config.order_book_limit),
    )
    .await?;

    let metrics = calculate_depth_metrics(Some(&order_book), Some(&ticker), config.depth_band);

    Ok((price, metrics))
}

/// Bounds a single exchange call, independently of the HTTP client's own
/// timeout.
async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ExchangeError>>,
) -> Result<T, ExchangeError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ExchangeError::Timeout(limit)),
    }
}
