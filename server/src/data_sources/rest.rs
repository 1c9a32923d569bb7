//! Shared plumbing for the public REST clients.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use super::output_data_format::MarketCatalog;
use crate::error::ExchangeError;

const USER_AGENT: &str = concat!("depth-monitor/", env!("CARGO_PKG_VERSION"));
const ERROR_BODY_LIMIT: usize = 256;

pub struct RestClient {
    exchange: &'static str,
    base_url: String,
    http: Client,
}

impl RestClient {
    pub fn new(
        exchange: &'static str,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            exchange,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        let url = self.endpoint(path, query)?;
        debug!(exchange = self.exchange, %url, "GET");

        let response = self.http.get(url).send().await?;
        let status = response.status();

        // 418 is what some exchanges answer once a client ignores repeated 429s
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
            return Err(ExchangeError::RateLimited);
        }

        let body = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                body: truncate(body, ERROR_BODY_LIMIT),
            });
        }

        serde_json::from_str(&body).map_err(|e| ExchangeError::malformed(e.to_string()))
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ExchangeError> {
        let raw = format!("{}{}", self.base_url, path);
        let url = if query.is_empty() {
            Url::parse(&raw)?
        } else {
            Url::parse_with_params(&raw, query)?
        };
        Ok(url)
    }
}

fn truncate(mut body: String, limit: usize) -> String {
    if body.len() > limit {
        let mut end = limit;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

/// Market catalog loaded at most once per client. A failed load leaves the
/// cell empty so the next cycle retries.
#[derive(Default)]
pub struct CatalogCache {
    cell: OnceCell<Arc<MarketCatalog>>,
}

impl CatalogCache {
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<MarketCatalog>, ExchangeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MarketCatalog, ExchangeError>>,
    {
        self.cell
            .get_or_try_init(|| async { load().await.map(Arc::new) })
            .await
            .cloned()
    }
}

enum DepthRule {
    UpTo(u16),
    OneOf(&'static [u16]),
}

/// Order-book depth an exchange will serve. A request above it is clamped,
/// with a warning the first time only.
pub struct DepthLimit {
    exchange: &'static str,
    rule: DepthRule,
    warned: AtomicBool,
}

impl DepthLimit {
    /// Any depth from 1 up to `max`.
    pub fn up_to(exchange: &'static str, max: u16) -> Self {
        Self::with_rule(exchange, DepthRule::UpTo(max))
    }

    /// Only the listed depths, ascending.
    pub fn one_of(exchange: &'static str, supported: &'static [u16]) -> Self {
        Self::with_rule(exchange, DepthRule::OneOf(supported))
    }

    fn with_rule(exchange: &'static str, rule: DepthRule) -> Self {
        Self {
            exchange,
            rule,
            warned: AtomicBool::new(false),
        }
    }

    /// For `OneOf`, the first supported depth that covers `requested`, or the
    /// largest one if none does.
    pub fn clamp(&self, requested: u16) -> u16 {
        let (depth, max) = match self.rule {
            DepthRule::UpTo(max) => (requested.clamp(1, max), max),
            DepthRule::OneOf(supported) => {
                let max = supported.last().copied().unwrap_or(requested);
                let depth = supported
                    .iter()
                    .copied()
                    .find(|&limit| limit >= requested)
                    .unwrap_or(max);
                (depth, max)
            }
        };

        if requested > max && !self.warned.swap(true, Ordering::Relaxed) {
            warn!(
                exchange = self.exchange,
                requested,
                "exchange supports only depth <= {}. Only first {} levels will be used.",
                max,
                max
            );
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_depths_round_up_to_next_limit() {
        let limit = DepthLimit::one_of("kucoin", &[20, 100]);
        assert_eq!(limit.clamp(20), 20);
        assert_eq!(limit.clamp(21), 100);
        assert!(!limit.warned.load(Ordering::Relaxed));
        assert_eq!(limit.clamp(200), 100);
    }

    #[test]
    fn capped_depth_never_exceeds_max() {
        let limit = DepthLimit::up_to("bitget", 150);
        assert_eq!(limit.clamp(50), 50);
        assert_eq!(limit.clamp(0), 1);
        assert!(!limit.warned.load(Ordering::Relaxed));
        assert_eq!(limit.clamp(200), 150);
    }

    #[test]
    fn clamping_warns_only_once_per_client() {
        let limit = DepthLimit::up_to("gateio", 100);

        assert_eq!(limit.clamp(200), 100);
        assert!(limit.warned.load(Ordering::Relaxed));

        // a second oversized request is still clamped, the flag just stays set
        assert_eq!(limit.clamp(200), 100);
        assert!(limit.warned.load(Ordering::Relaxed));
    }

    #[test]
    fn endpoint_encodes_query() {
        let client =
            RestClient::new("test", "https://api.example.com/", Duration::from_secs(1)).unwrap();
        let url = client
            .endpoint("/depth", &[("symbol", "BTC-USDT"), ("limit", "20")])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/depth?symbol=BTC-USDT&limit=20");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo".to_string(), 2), "h");
        assert_eq!(truncate("short".to_string(), 64), "short");
    }

    #[tokio::test]
    async fn catalog_cache_retries_after_failure_and_keeps_success() {
        let cache = CatalogCache::default();

        let failed = cache
            .get_or_load(|| async { Err(ExchangeError::RateLimited) })
            .await;
        assert!(failed.is_err());

        let loaded = cache
            .get_or_load(|| async { Ok(MarketCatalog::default()) })
            .await
            .unwrap();
        assert!(loaded.is_empty());

        let cached = cache
            .get_or_load(|| async { Err(ExchangeError::RateLimited) })
            .await;
        assert!(cached.is_ok());
    }
}
