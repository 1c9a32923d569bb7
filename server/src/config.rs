use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::Serialize;

use crate::data_sources::output_data_format::TradingPair;
use crate::data_sources::ExchangeId;
use crate::helpers::{get_env_list_or_default, get_env_var_or_default, parse_list};
use crate::summary::CollectorConfig;

const DEFAULT_PAIRS: &str = "XTER/USDT,PAL/USDT";
const DEFAULT_EXCHANGES: &str = "bybit,bitget,gateio,mexc,htx,kucoin";
const DEFAULT_ALERT_THRESHOLD: f64 = 2000.0;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;
const DEFAULT_MAX_WORKERS: usize = 5;
const DEFAULT_ORDER_BOOK_LIMIT: u16 = 200;
const DEFAULT_DEPTH_BAND_PCT: f64 = 2.0;
const DEFAULT_REFRESH_INTERVAL_MS: u64 = 4000;
const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const DEFAULT_PORT: u16 = 5000;

/// Server settings, read once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub pairs: Vec<TradingPair>,
    pub exchanges: Vec<ExchangeId>,
    /// Quote notional below which the dashboard flags a depth figure.
    pub alert_threshold: f64,
    pub request_timeout: Duration,
    pub max_workers: usize,
    pub order_book_limit: u16,
    /// Half-width of the depth band, in percent of the last price.
    pub depth_band_pct: f64,
    pub refresh_interval_ms: u64,
    pub bind_addr: IpAddr,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let depth_band_pct = get_env_var_or_default("DEPTH_BAND_PCT", DEFAULT_DEPTH_BAND_PCT);
        let depth_band_pct = if depth_band_pct.is_finite() && depth_band_pct > 0.0 {
            depth_band_pct
        } else {
            tracing::warn!(depth_band_pct, "depth band must be positive, using the default");
            DEFAULT_DEPTH_BAND_PCT
        };

        Self {
            pairs: get_env_list_or_default("PAIRS", DEFAULT_PAIRS),
            exchanges: get_env_list_or_default("EXCHANGES", DEFAULT_EXCHANGES),
            alert_threshold: get_env_var_or_default("ALERT_THRESHOLD", DEFAULT_ALERT_THRESHOLD),
            request_timeout: Duration::from_millis(get_env_var_or_default(
                "REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            max_workers: get_env_var_or_default("MAX_WORKERS", DEFAULT_MAX_WORKERS),
            order_book_limit: get_env_var_or_default("ORDER_BOOK_LIMIT", DEFAULT_ORDER_BOOK_LIMIT),
            depth_band_pct,
            refresh_interval_ms: get_env_var_or_default(
                "REFRESH_INTERVAL_MS",
                DEFAULT_REFRESH_INTERVAL_MS,
            ),
            bind_addr: get_env_var_or_default("BIND_ADDR", DEFAULT_BIND_ADDR),
            port: get_env_var_or_default("PORT", DEFAULT_PORT),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// The slice of the settings a collection cycle needs.
    pub fn collector(&self) -> CollectorConfig {
        CollectorConfig {
            pairs: self.pairs.clone(),
            request_timeout: self.request_timeout,
            max_workers: self.max_workers,
            order_book_limit: self.order_book_limit,
            depth_band: self.depth_band_pct / 100.0,
        }
    }

    pub fn dashboard(&self) -> DashboardSettings {
        DashboardSettings {
            alert_threshold: self.alert_threshold,
            depth_band_pct: self.depth_band_pct,
            refresh_interval_ms: self.refresh_interval_ms,
            pairs: self.pairs.clone(),
            exchanges: self.exchanges.iter().map(|id| id.as_str().to_uppercase()).collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pairs: parse_list(DEFAULT_PAIRS).unwrap_or_default(),
            exchanges: parse_list(DEFAULT_EXCHANGES).unwrap_or_default(),
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            max_workers: DEFAULT_MAX_WORKERS,
            order_book_limit: DEFAULT_ORDER_BOOK_LIMIT,
            depth_band_pct: DEFAULT_DEPTH_BAND_PCT,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            bind_addr: DEFAULT_BIND_ADDR,
            port: DEFAULT_PORT,
        }
    }
}

/// What the presentation side needs to render a snapshot.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub alert_threshold: f64,
    pub depth_band_pct: f64,
    pub refresh_interval_ms: u64,
    pub pairs: Vec<TradingPair>,
    pub exchanges: Vec<String>,
}
