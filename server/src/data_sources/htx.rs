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

/// HTX wraps payloads in either `data` (reference endpoints) or `tick`
/// (market endpoints).
#[derive(Deserialize, Debug)]
struct HtxResponse<T> {
    status: String,
    #[serde(rename = "err-code")]
    err_code: Option<String>,
    #[serde(rename = "err-msg")]
    err_msg: Option<String>,
    #[serde(alias = "tick")]
    data: Option<T>,
}

impl<T> HtxResponse<T> {
    fn into_result(self) -> Result<T, ExchangeError> {
        if self.status != "ok" {
            let code = self.err_code.unwrap_or_else(|| self.status.clone());
            if code == HTX_RATE_LIMIT_CODE {
                return Err(ExchangeError::RateLimited);
            }
            return Err(ExchangeError::Api {
                code,
                message: self.err_msg.unwrap_or_default(),
            });
        }

        self.data
            .ok_or_else(|| ExchangeError::malformed("HTX response without payload"))
    }
}

#[derive(Deserialize, Debug)]
struct HtxSymbol {
    symbol: String,
    #[serde(rename = "base-currency")]
    base_currency: String,
    #[serde(rename = "quote-currency")]
    quote_currency: String,
}

/// `bid` and `ask` are `[price, size]`.
#[derive(Deserialize, Debug)]
struct HtxMergedTick {
    close: Option<RawNumber>,
    bid: Option<Vec<RawNumber>>,
    ask: Option<Vec<RawNumber>>,
}

#[derive(Deserialize, Debug)]
pub struct HtxDepthTick {
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
}

impl TryFrom<HtxDepthTick> for OrderBook {
    type Error = ExchangeError;

    fn try_from(tick: HtxDepthTick) -> Result<Self, Self::Error> {
        Ok(OrderBook::new(parse_levels(&tick.bids)?, parse_levels(&tick.asks)?))
    }
}

impl TryFrom<HtxMergedTick> for Ticker {
    type Error = ExchangeError;

    fn try_from(tick: HtxMergedTick) -> Result<Self, Self::Error> {
        let best = |level: &Option<Vec<RawNumber>>| {
            parse_optional_price(level.as_ref().and_then(|level| level.first()))
        };

        Ok(Ticker {
            last: parse_optional_price(tick.close.as_ref())?,
            bid: best(&tick.bid)?,
            ask: best(&tick.ask)?,
        })
    }
}

fn catalog_from(symbols: Vec<HtxSymbol>) -> MarketCatalog {
    symbols
        .into_iter()
        .map(|symbol| {
            let pair = TradingPair::new(&symbol.base_currency, &symbol.quote_currency);
            (pair, symbol.symbol)
        })
        .collect()
}

const HTX_API_BASE_URL: &str = "https://api.huobi.pro";
const HTX_RATE_LIMIT_CODE: &str = "api-rate-limit";
// `depth` only accepts 5, 10 and 20; leaving it out returns 150 levels
const HTX_SUPPORTED_DEPTH_LIMITS: [u16; 4] = [5, 10, 20, 150];
const HTX_FULL_DEPTH: u16 = 150;

pub struct HtxClient {
    rest: RestClient,
    catalog: CatalogCache,
    depth: DepthLimit,
}

impl HtxClient {
    pub fn new(timeout: Duration) -> Result<Self, ExchangeError> {
        let base_url = get_env_var_or_default("HTX_API_BASE_URL", HTX_API_BASE_URL.to_string());
        Self::with_base_url(base_url, timeout)
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, ExchangeError> {
        Ok(Self {
            rest: RestClient::new("htx", base_url, timeout)?,
            catalog: CatalogCache::default(),
            depth: DepthLimit::one_of("htx", &HTX_SUPPORTED_DEPTH_LIMITS),
        })
    }

    async fn fetch_catalog(&self) -> Result<MarketCatalog, ExchangeError> {
        let response: HtxResponse<Vec<HtxSymbol>> =
            self.rest.get_json("/v1/common/symbols", &[]).await?;
        Ok(catalog_from(response.into_result()?))
    }
}

#[async_trait]
impl ExchangeClient for HtxClient {
    fn name(&self) -> &'static str {
        "htx"
    }

    async fn load_markets(&self) -> Result<Arc<MarketCatalog>, ExchangeError> {
        self.catalog.get_or_load(|| self.fetch_catalog()).await
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<Ticker, ExchangeError> {
        let catalog = self.load_markets().await?;
        let symbol = catalog.native_symbol(pair)?;
        let response: HtxResponse<HtxMergedTick> = self
            .rest
            .get_json("/market/detail/merged", &[("symbol", symbol)])
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
        let depth_param = depth.to_string();

        let mut query = vec![("symbol", symbol), ("type", "step0")];
        if depth != HTX_FULL_DEPTH {
            query.push(("depth", depth_param.as_str()));
        }

        let response: HtxResponse<HtxDepthTick> =
            self.rest.get_json("/market/depth", &query).await?;

        let mut order_book = OrderBook::try_from(response.into_result()?)?;
        order_book.truncate(limit as usize);
        Ok(order_book)
    }
}
