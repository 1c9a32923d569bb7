use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::output_data_format::{
    parse_levels, parse_optional_price, MarketCatalog, OrderBook, RawLevel,
    RawNumber, Ticker, TradingPair,
};
use super::rest::{CatalogCache, DepthLimit, RestClient};
use super::ExchangeClient;
use crate::error::ExchangeError;
use crate::helpers::get_env_var_or_default;

#[derive(Deserialize, Debug)]
struct GateioCurrencyPair {
    id: String,
    base: String,
    quote: String,
}

#[derive(Deserialize, Debug)]
struct GateioTicker {
    last: Option<RawNumber>,
    highest_bid: Option<RawNumber>,
    lowest_ask: Option<RawNumber>,
}

#[derive(Deserialize, Debug)]
pub struct GateioOrderBook {
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
}

impl TryFrom<GateioOrderBook> for OrderBook {
    type Error = ExchangeError;

    fn try_from(book: GateioOrderBook) -> Result<Self, Self::Error> {
        Ok(OrderBook::new(parse_levels(&book.bids)?, parse_levels(&book.asks)?))
    }
}

impl TryFrom<GateioTicker> for Ticker {
    type Error = ExchangeError;

    fn try_from(ticker: GateioTicker) -> Result<Self, Self::Error> {
        Ok(Ticker {
            last: parse_optional_price(ticker.last.as_ref())?,
            bid: parse_optional_price(ticker.highest_bid.as_ref())?,
            ask: parse_optional_price(ticker.lowest_ask.as_ref())?,
        })
    }
}

fn catalog_from(pairs: Vec<GateioCurrencyPair>) -> MarketCatalog {
    pairs
        .into_iter()
        .map(|currency_pair| {
            let pair = TradingPair::new(&currency_pair.base, &currency_pair.quote);
            (pair, currency_pair.id)
        })
        .collect()
}

const GATEIO_API_BASE_URL: &str = "https://api.gateio.ws/api/v4";
const GATEIO_MAX_DEPTH: u16 = 100;

/// Gate.io spot API. Errors come back as non-2xx statuses with a
/// `{"label", "message"}` body, so there is no envelope to unwrap.
pub struct GateioClient {
    rest: RestClient,
    catalog: CatalogCache,
    depth: DepthLimit,
}

impl GateioClient {
    pub fn new(timeout: Duration) -> Result<Self, ExchangeError> {
        let base_url =
            get_env_var_or_default("GATEIO_API_BASE_URL", GATEIO_API_BASE_URL.to_string());
        Self::with_base_url(base_url, timeout)
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, ExchangeError> {
        Ok(Self {
            rest: RestClient::new("gateio", base_url, timeout)?,
            catalog: CatalogCache::default(),
            depth: DepthLimit::up_to("gateio", GATEIO_MAX_DEPTH),
        })
    }

    async fn fetch_catalog(&self) -> Result<MarketCatalog, ExchangeError> {
        let pairs: Vec<GateioCurrencyPair> =
            self.rest.get_json("/spot/currency_pairs", &[]).await?;
        Ok(catalog_from(pairs))
    }
}

#[async_trait]
impl ExchangeClient for GateioClient {
    fn name(&self) -> &'static str {
        "gateio"
    }

    async fn load_markets(&self) -> Result<Arc<MarketCatalog>, ExchangeError> {
        self.catalog.get_or_load(|| self.fetch_catalog()).await
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<Ticker, ExchangeError> {
        let catalog = self.load_markets().await?;
        let symbol = catalog.native_symbol(pair)?;
        let tickers: Vec<GateioTicker> = self
            .rest
            .get_json("/spot/tickers", &[("currency_pair", symbol)])
            .await?;

        tickers
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::malformed(format!("no Gate.io ticker for {}", symbol)))?
            .try_into()
    }

    async fn fetch_order_book(
        &self,
        pair: &TradingPair,
        limit: u16,
    ) -> Result<OrderBook, ExchangeError> {
        let catalog = self.load_markets().await?;
        let symbol = catalog.native_symbol(pair)?;
        let depth = self.depth.clamp(limit).to_string();
        let book: GateioOrderBook = self
            .rest
            .get_json(
                "/spot/order_book",
                &[("currency_pair", symbol), ("limit", depth.as_str())],
            )
            .await?;

        let mut order_book = OrderBook::try_from(book)?;
        order_book.truncate(limit as usize);
        Ok(order_book)
    }
}
