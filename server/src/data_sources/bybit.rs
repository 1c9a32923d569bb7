use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::output_data_format::{
    parse_levels, parse_optional_price, MarketCatalog, OrderBook, RawLevel, RawNumber, Ticker,
    TradingPair,
};
use super::rest::{CatalogCache, DepthLimit, RestClient};
use super::ExchangeClient;
use crate::error::ExchangeError;
use crate::helpers::get_env_var_or_default;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BybitResponse<T> {
    ret_code: i64,
    ret_msg: String,
    result: Option<T>,
}

impl<T> BybitResponse<T> {
    fn into_result(self) -> Result<T, ExchangeError> {
        match self.ret_code {
            0 => self
                .result
                .ok_or_else(|| ExchangeError::malformed("Bybit response without result")),
            BYBIT_RATE_LIMIT_CODE => Err(ExchangeError::RateLimited),
            code => Err(ExchangeError::Api {
                code: code.to_string(),
                message: self.ret_msg,
            }),
        }
    }
}

#[derive(Deserialize, Debug)]
struct BybitList<T> {
    list: Vec<T>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BybitInstrument {
    symbol: String,
    base_coin: String,
    quote_coin: String,
}

#[derive(Deserialize, Debug)]
struct BybitTicker {
    #[serde(rename = "lastPrice")]
    last_price: Option<RawNumber>,
    #[serde(rename = "bid1Price")]
    bid_price: Option<RawNumber>,
    #[serde(rename = "ask1Price")]
    ask_price: Option<RawNumber>,
}

#[derive(Deserialize, Debug)]
pub struct BybitOrderBook {
    #[serde(rename = "b")]
    pub bids: Vec<RawLevel>,
    #[serde(rename = "a")]
    pub asks: Vec<RawLevel>,
}

impl TryFrom<BybitOrderBook> for OrderBook {
    type Error = ExchangeError;

    fn try_from(book: BybitOrderBook) -> Result<Self, Self::Error> {
        Ok(OrderBook::new(parse_levels(&book.bids)?, parse_levels(&book.asks)?))
    }
}

impl TryFrom<BybitTicker> for Ticker {
    type Error = ExchangeError;

    fn try_from(ticker: BybitTicker) -> Result<Self, Self::Error> {
        Ok(Ticker {
            last: parse_optional_price(ticker.last_price.as_ref())?,
            bid: parse_optional_price(ticker.bid_price.as_ref())?,
            ask: parse_optional_price(ticker.ask_price.as_ref())?,
        })
    }
}

fn catalog_from(instruments: Vec<BybitInstrument>) -> MarketCatalog {
    instruments
        .into_iter()
        .map(|instrument| {
            let pair = TradingPair::new(&instrument.base_coin, &instrument.quote_coin);
            (pair, instrument.symbol)
        })
        .collect()
}

const BYBIT_API_BASE_URL: &str = "https://api.bybit.com";
const BYBIT_CATEGORY: &str = "spot";
const BYBIT_MAX_DEPTH: u16 = 200;
const BYBIT_RATE_LIMIT_CODE: i64 = 10006;

pub struct BybitClient {
    rest: RestClient,
    catalog: CatalogCache,
    depth: DepthLimit,
}

impl BybitClient {
    pub fn new(timeout: Duration) -> Result<Self, ExchangeError> {
        let base_url =
            get_env_var_or_default("BYBIT_API_BASE_URL", BYBIT_API_BASE_URL.to_string());
        Self::with_base_url(base_url, timeout)
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, ExchangeError> {
        Ok(Self {
            rest: RestClient::new("bybit", base_url, timeout)?,
            catalog: CatalogCache::default(),
            depth: DepthLimit::up_to("bybit", BYBIT_MAX_DEPTH),
        })
    }

    async fn fetch_catalog(&self) -> Result<MarketCatalog, ExchangeError> {
        let response: BybitResponse<BybitList<BybitInstrument>> = self
            .rest
            .get_json("/v5/market/instruments-info", &[("category", BYBIT_CATEGORY)])
            .await?;
        Ok(catalog_from(response.into_result()?.list))
    }
}

#[async_trait]
impl ExchangeClient for BybitClient {
    fn name(&self) -> &'static str {
        "bybit"
    }

    async fn load_markets(&self) -> Result<Arc<MarketCatalog>, ExchangeError> {
        self.catalog.get_or_load(|| self.fetch_catalog()).await
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<Ticker, ExchangeError> {
        let catalog = self.load_markets().await?;
        let symbol = catalog.native_symbol(pair)?;
        let response: BybitResponse<BybitList<BybitTicker>> = self
            .rest
            .get_json(
                "/v5/market/tickers",
                &[("category", BYBIT_CATEGORY), ("symbol", symbol)],
            )
            .await?;

        response
            .into_result()?
            .list
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::malformed(format!("no Bybit ticker for {}", symbol)))?
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
        let response: BybitResponse<BybitOrderBook> = self
            .rest
            .get_json(
                "/v5/market/orderbook",
                &[
                    ("category", BYBIT_CATEGORY),
                    ("symbol", symbol),
                    ("limit", depth.as_str()),
                ],
            )
            .await?;

        let mut order_book = OrderBook::try_from(response.into_result()?)?;
        order_book.truncate(limit as usize);
        Ok(order_book)
    }
}
