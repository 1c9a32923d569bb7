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
struct MexcExchangeInfo {
    symbols: Vec<MexcSymbol>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct MexcSymbol {
    symbol: String,
    base_asset: String,
    quote_asset: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct MexcTicker {
    last_price: Option<RawNumber>,
    bid_price: Option<RawNumber>,
    ask_price: Option<RawNumber>,
}

#[derive(Deserialize, Debug)]
pub struct MexcOrderBook {
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
}

impl TryFrom<MexcOrderBook> for OrderBook {
    type Error = ExchangeError;

    fn try_from(book: MexcOrderBook) -> Result<Self, Self::Error> {
        Ok(OrderBook::new(parse_levels(&book.bids)?, parse_levels(&book.asks)?))
    }
}

impl TryFrom<MexcTicker> for Ticker {
    type Error = ExchangeError;

    fn try_from(ticker: MexcTicker) -> Result<Self, Self::Error> {
        Ok(Ticker {
            last: parse_optional_price(ticker.last_price.as_ref())?,
            bid: parse_optional_price(ticker.bid_price.as_ref())?,
            ask: parse_optional_price(ticker.ask_price.as_ref())?,
        })
    }
}

fn catalog_from(symbols: Vec<MexcSymbol>) -> MarketCatalog {
    symbols
        .into_iter()
        .map(|symbol| {
            let pair = TradingPair::new(&symbol.base_asset, &symbol.quote_asset);
            (pair, symbol.symbol)
        })
        .collect()
}

const MEXC_API_BASE_URL: &str = "https://api.mexc.com";
const MEXC_MAX_DEPTH: u16 = 5000;

pub struct MexcClient {
    rest: RestClient,
    catalog: CatalogCache,
    depth: DepthLimit,
}

impl MexcClient {
    pub fn new(timeout: Duration) -> Result<Self, ExchangeError> {
        let base_url = get_env_var_or_default("MEXC_API_BASE_URL", MEXC_API_BASE_URL.to_string());
        Self::with_base_url(base_url, timeout)
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, ExchangeError> {
        Ok(Self {
            rest: RestClient::new("mexc", base_url, timeout)?,
            catalog: CatalogCache::default(),
            depth: DepthLimit::up_to("mexc", MEXC_MAX_DEPTH),
        })
    }

    async fn fetch_catalog(&self) -> Result<MarketCatalog, ExchangeError> {
        let info: MexcExchangeInfo = self.rest.get_json("/api/v3/exchangeInfo", &[]).await?;
        Ok(catalog_from(info.symbols))
    }
}

#[async_trait]
impl ExchangeClient for MexcClient {
    fn name(&self) -> &'static str {
        "mexc"
    }

    async fn load_markets(&self) -> Result<Arc<MarketCatalog>, ExchangeError> {
        self.catalog.get_or_load(|| self.fetch_catalog()).await
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<Ticker, ExchangeError> {
        let catalog = self.load_markets().await?;
        let symbol = catalog.native_symbol(pair)?;
        let ticker: MexcTicker = self
            .rest
            .get_json("/api/v3/ticker/24hr", &[("symbol", symbol)])
            .await?;

        ticker.try_into()
    }

    async fn fetch_order_book(
        &self,
        pair: &TradingPair,
        limit: u16,
    ) -> Result<OrderBook, ExchangeError> {
        let catalog = self.load_markets().await?;
        let symbol = catalog.native_symbol(pair)?;
        let depth = self.depth.clamp(limit).to_string();
        let book: MexcOrderBook = self
            .rest
            .get_json(
                "/api/v3/depth",
                &[("symbol", symbol), ("limit", depth.as_str())],
            )
            .await?;

        let mut order_book = OrderBook::try_from(book)?;
        order_book.truncate(limit as usize);
        Ok(order_book)
    }
}
