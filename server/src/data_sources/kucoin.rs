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
struct KucoinResponse<T> {
    code: String,
    msg: Option<String>,
    data: Option<T>,
}

impl<T> KucoinResponse<T> {
    fn into_result(self) -> Result<T, ExchangeError> {
        match self.code.as_str() {
            KUCOIN_SUCCESS_CODE => self
                .data
                .ok_or_else(|| ExchangeError::malformed("KuCoin response without data")),
            KUCOIN_RATE_LIMIT_CODE => Err(ExchangeError::RateLimited),
            _ => Err(ExchangeError::Api {
                code: self.code,
                message: self.msg.unwrap_or_default(),
            }),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct KucoinSymbol {
    symbol: String,
    base_currency: String,
    quote_currency: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct KucoinLevel1 {
    price: Option<RawNumber>,
    best_bid: Option<RawNumber>,
    best_ask: Option<RawNumber>,
}

#[derive(Deserialize, Debug)]
pub struct KucoinOrderBook {
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
}

impl TryFrom<KucoinOrderBook> for OrderBook {
    type Error = ExchangeError;

    fn try_from(book: KucoinOrderBook) -> Result<Self, Self::Error> {
        Ok(OrderBook::new(parse_levels(&book.bids)?, parse_levels(&book.asks)?))
    }
}

impl TryFrom<KucoinLevel1> for Ticker {
    type Error = ExchangeError;

    fn try_from(level1: KucoinLevel1) -> Result<Self, Self::Error> {
        Ok(Ticker {
            last: parse_optional_price(level1.price.as_ref())?,
            bid: parse_optional_price(level1.best_bid.as_ref())?,
            ask: parse_optional_price(level1.best_ask.as_ref())?,
        })
    }
}

fn catalog_from(symbols: Vec<KucoinSymbol>) -> MarketCatalog {
    symbols
        .into_iter()
        .map(|symbol| {
            let pair = TradingPair::new(&symbol.base_currency, &symbol.quote_currency);
            (pair, symbol.symbol)
        })
        .collect()
}

const KUCOIN_API_BASE_URL: &str = "https://api.kucoin.com";
const KUCOIN_SUCCESS_CODE: &str = "200000";
const KUCOIN_RATE_LIMIT_CODE: &str = "429000";
// Public partial books only come in these two sizes
const KUCOIN_SUPPORTED_DEPTH_LIMITS: [u16; 2] = [20, 100];

pub struct KucoinClient {
    rest: RestClient,
    catalog: CatalogCache,
    depth: DepthLimit,
}

impl KucoinClient {
    pub fn new(timeout: Duration) -> Result<Self, ExchangeError> {
        let base_url =
            get_env_var_or_default("KUCOIN_API_BASE_URL", KUCOIN_API_BASE_URL.to_string());
        Self::with_base_url(base_url, timeout)
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, ExchangeError> {
        Ok(Self {
            rest: RestClient::new("kucoin", base_url, timeout)?,
            catalog: CatalogCache::default(),
            depth: DepthLimit::one_of("kucoin", &KUCOIN_SUPPORTED_DEPTH_LIMITS),
        })
    }

    async fn fetch_catalog(&self) -> Result<MarketCatalog, ExchangeError> {
        let response: KucoinResponse<Vec<KucoinSymbol>> =
            self.rest.get_json("/api/v2/symbols", &[]).await?;
        Ok(catalog_from(response.into_result()?))
    }
}

#[async_trait]
impl ExchangeClient for KucoinClient {
    fn name(&self) -> &'static str {
        "kucoin"
    }

    async fn load_markets(&self) -> Result<Arc<MarketCatalog>, ExchangeError> {
        self.catalog.get_or_load(|| self.fetch_catalog()).await
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<Ticker, ExchangeError> {
        let catalog = self.load_markets().await?;
        let symbol = catalog.native_symbol(pair)?;
        let response: KucoinResponse<KucoinLevel1> = self
            .rest
            .get_json("/api/v1/market/orderbook/level1", &[("symbol", symbol)])
            .await?;

        response.into_result()?.try_into()
    }

    async fn fetch_order_book(
        &self,
        pair: &TradingPair,
        limit: u16,
    ) -> Result<OrderBook, ExchangeError> {
        let catalog = self.load_markets().await?;
        let symbol = catalog.native_symbol(pair)?;
        let depth = self.depth.clamp(limit);
        let path = format!("/api/v1/market/orderbook/level2_{}", depth);
        let response: KucoinResponse<KucoinOrderBook> = self
            .rest
            .get_json(&path, &[("symbol", symbol)])
            .await?;

        let mut order_book = OrderBook::try_from(response.into_result()?)?;
        order_book.truncate(limit as usize);
        Ok(order_book)
    }
}
