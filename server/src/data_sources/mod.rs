//! Public REST access to the supported exchanges.
//!
//! Every exchange is wrapped in an [`ExchangeClient`] that speaks the
//! exchange's own wire format and hands back the unified types from
//! [`output_data_format`]. Clients are independent of each other: each owns
//! its HTTP connection pool and its cached market catalog.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

// Unified output data format
pub mod output_data_format;
use output_data_format::{MarketCatalog, OrderBook, Ticker, TradingPair};

mod rest;

// Exchanges
pub mod bitget;
pub mod bybit;
pub mod gateio;
pub mod htx;
pub mod kucoin;
pub mod mexc;

use crate::error::ExchangeError;

#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Lowercase exchange id, e.g. `bybit`.
    fn name(&self) -> &'static str;

    /// Pairs listed on the exchange. Cached after the first successful load.
    async fn load_markets(&self) -> Result<Arc<MarketCatalog>, ExchangeError>;

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<Ticker, ExchangeError>;

    /// At most `limit` levels per side, bids highest first and asks lowest
    /// first, in the order the exchange returned them.
    async fn fetch_order_book(
        &self,
        pair: &TradingPair,
        limit: u16,
    ) -> Result<OrderBook, ExchangeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeId {
    Bybit,
    Bitget,
    Gateio,
    Mexc,
    Htx,
    Kucoin,
}

impl ExchangeId {
    pub const ALL: [ExchangeId; 6] = [
        ExchangeId::Bybit,
        ExchangeId::Bitget,
        ExchangeId::Gateio,
        ExchangeId::Mexc,
        ExchangeId::Htx,
        ExchangeId::Kucoin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Bybit => "bybit",
            ExchangeId::Bitget => "bitget",
            ExchangeId::Gateio => "gateio",
            ExchangeId::Mexc => "mexc",
            ExchangeId::Htx => "htx",
            ExchangeId::Kucoin => "kucoin",
        }
    }
}

impl FromStr for ExchangeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bybit" => Ok(ExchangeId::Bybit),
            "bitget" => Ok(ExchangeId::Bitget),
            "gateio" | "gate" => Ok(ExchangeId::Gateio),
            "mexc" => Ok(ExchangeId::Mexc),
            "htx" | "huobi" => Ok(ExchangeId::Htx),
            "kucoin" => Ok(ExchangeId::Kucoin),
            other => Err(format!("unsupported exchange {:?}", other)),
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn build_client(
    id: ExchangeId,
    timeout: Duration,
) -> Result<Arc<dyn ExchangeClient>, ExchangeError> {
    let client: Arc<dyn ExchangeClient> = match id {
        ExchangeId::Bybit => Arc::new(bybit::BybitClient::new(timeout)?),
        ExchangeId::Bitget => Arc::new(bitget::BitgetClient::new(timeout)?),
        ExchangeId::Gateio => Arc::new(gateio::GateioClient::new(timeout)?),
        ExchangeId::Mexc => Arc::new(mexc::MexcClient::new(timeout)?),
        ExchangeId::Htx => Arc::new(htx::HtxClient::new(timeout)?),
        ExchangeId::Kucoin => Arc::new(kucoin::KucoinClient::new(timeout)?),
    };
    Ok(client)
}

/// One client per configured exchange, in configuration order.
pub fn build_clients(
    ids: &[ExchangeId],
    timeout: Duration,
) -> Result<Vec<Arc<dyn ExchangeClient>>, ExchangeError> {
    ids.iter().map(|&id| build_client(id, timeout)).collect()
}
