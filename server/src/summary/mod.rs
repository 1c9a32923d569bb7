//! Liquidity summary of every (exchange, pair) combination.
//!
//! A collection cycle fans out over the exchange clients ([`collect`]),
//! walks the configured pairs on each exchange ([`fetch`]) and reduces every
//! order book to depth and spread figures ([`calculate`]).

use std::time::Duration;

use serde::Serialize;

use crate::data_sources::output_data_format::TradingPair;
use crate::error::FetchErrorKind;

pub mod calculate;
pub mod collect;
pub mod fetch;

pub use calculate::{calculate_depth_metrics, DepthMetrics};
pub use collect::Collector;
pub use fetch::fetch_exchange;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStatus {
    Active,
    #[serde(rename = "Not Listed")]
    NotListed,
    Error,
}

/// Metrics for one pair on one exchange in one cycle.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MetricsRecord {
    pub exchange: String,
    pub symbol: TradingPair,
    pub status: PairStatus,
    pub price: Option<f64>,
    pub bid_depth: f64,
    pub ask_depth: f64,
    pub spread: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FetchErrorKind>,
}

impl MetricsRecord {
    pub fn active(exchange: &str, symbol: &TradingPair, price: f64, metrics: DepthMetrics) -> Self {
        Self {
            exchange: exchange.to_string(),
            symbol: symbol.clone(),
            status: PairStatus::Active,
            price: Some(price),
            bid_depth: metrics.bid_depth,
            ask_depth: metrics.ask_depth,
            spread: metrics.spread_pct,
            error: None,
        }
    }

    pub fn not_listed(exchange: &str, symbol: &TradingPair) -> Self {
        Self::empty(exchange, symbol, PairStatus::NotListed, None)
    }

    pub fn failed(exchange: &str, symbol: &TradingPair, kind: FetchErrorKind) -> Self {
        Self::empty(exchange, symbol, PairStatus::Error, Some(kind))
    }

    fn empty(
        exchange: &str,
        symbol: &TradingPair,
        status: PairStatus,
        error: Option<FetchErrorKind>,
    ) -> Self {
        Self {
            exchange: exchange.to_string(),
            symbol: symbol.clone(),
            status,
            price: None,
            bid_depth: 0.0,
            ask_depth: 0.0,
            spread: None,
            error,
        }
    }
}

/// Everything a collection cycle needs to know.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub pairs: Vec<TradingPair>,
    pub request_timeout: Duration,
    pub max_workers: usize,
    pub order_book_limit: u16,
    /// Half-width of the depth band as a fraction of the last price.
    pub depth_band: f64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            request_timeout: Duration::from_secs(5),
            max_workers: 5,
            order_book_limit: 200,
            depth_band: calculate::DEFAULT_DEPTH_BAND,
        }
    }
}
