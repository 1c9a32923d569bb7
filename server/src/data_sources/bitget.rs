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
struct BitgetResponse<T> {
    code: String,
    msg: String,
    data: Option<T>,
}

impl<T> BitgetResponse<T> {
    fn into_result(self) -> Result<T, ExchangeError> {
        match self.code.as_str() {
            BITGET_SUCCESS_CODE => self
                .data
                .ok_or_else(|| ExchangeError::malformed("Bitget response without data")),
            BITGET_RATE_LIMIT_CODE => Err(ExchangeError::RateLimited),
            _ => Err(ExchangeError::Api {
                code: self.code,
                message: self.msg,
            }),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BitgetSymbol {
    symbol: String,
    base_coin: String,
    quote_coin: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BitgetTicker {
    last_pr: Option<RawNumber>,
    bid_pr: Option<RawNumber>,
    ask_pr: Option<RawNumber>,
}

#[derive(Deserialize, Debug)]
pub struct BitgetOrderBook {
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
}

impl TryFrom<BitgetOrderBook> for OrderBook {
    type Error = ExchangeError;

    fn try_from(book: BitgetOrderBook) -> Result<Self, Self::Error> {
        Ok(OrderBook::new(parse_levels(&book.bids)?, parse_levels(&book.asks)?))
    }
}

impl TryFrom<BitgetTicker> for Ticker {
    type Error = ExchangeError;

    fn try_from(ticker: BitgetTicker) -> Result<Self, Self::Error> {
        Ok(Ticker {
            last: parse_optional_price(ticker.last_pr.as_ref())?,
            bid: parse_optional_price(ticker.bid_pr.as_ref())?,
            ask: parse_optional_price(ticker.ask_pr.as_ref())?,
        })
    }
}

fn catalog_from(symbols: Vec<BitgetSymbol>) -> MarketCatalog {
    symbols
        .into_iter()
        .map(|symbol| {
            let pair = TradingPair::new(&symbol.base_coin, &symbol.quote_coin);
            (pair, symbol.symbol)
        })
        .collect()
}

const BITGET_API_BASE_URL: &str = "https://api.bitget.com";
const BITGET_SUCCESS_CODE: &str = "00000";
const BITGET_RATE_LIMIT_CODE: &str = "429";
const BITGET_MAX_DEPTH: u16 = 150;

pub struct BitgetClient {
    rest: RestClient,
    catalog: CatalogCache,
    depth: DepthLimit,
}

impl BitgetClient {
    pub fn new(timeout: Duration) -> Result<Self, ExchangeError> {
        let base_url =
            get_env_var_or_default("BITGET_API_BASE_URL", BITGET_API_BASE_URL.to_string());
        Self::with_base_url(base_url, timeout)
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, ExchangeError> {
        Ok(Self {
            rest: RestClient::new("bitget", base_url, timeout)?,
            catalog: CatalogCache::default(),
            depth: DepthLimit::up_to("bitget", BITGET_MAX_DEPTH),
        })
    }

    async fn fetch_catalog(&self) -> Result<MarketCatalog, ExchangeError> {
        let response: BitgetResponse<Vec<BitgetSymbol>> =
            self.rest.get_json("/api/v2/spot/public/symbols", &[]).await?;
        Ok(catalog_from(response.into_result()?))
    }
}

#[async_trait]
impl ExchangeClient for BitgetClient {
    fn name(&self) -> &'static str {
        "bitget"
    }

    async fn load_markets(&self) -> Result<Arc<MarketCatalog>, ExchangeError> {
        self.catalog.get_or_load(|| self.fetch_catalog()).await
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<Ticker, ExchangeError> {
        let catalog = self.load_markets().await?;
        let symbol = catalog.native_symbol(pair)?;
        let response: BitgetResponse<Vec<BitgetTicker>> = self
            .rest
            .get_json("/api/v2/spot/market/tickers", &[("symbol", symbol)])
            .await?;

        response
            .into_result()?
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::malformed(format!("no Bitget ticker for {}", symbol)))?
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
        let response: BitgetResponse<BitgetOrderBook> = self
            .rest
            .get_json(
                "/api/v2/spot/market/orderbook",
                &[
                    ("symbol", symbol),
                    ("type", "step0"),
                    ("limit", depth.as_str()),
                ],
            )
            .await?;

        let mut order_book = OrderBook::try_from(response.into_result()?)?;
        order_book.truncate(limit as usize);
        Ok(order_book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_become_catalog() {
        let json = r#"{"code":"00000","msg":"success","requestTime":1695808949356,"data":[
            {"symbol":"PALUSDT","baseCoin":"PAL","quoteCoin":"USDT","status":"online"},
            {"symbol":"OLDUSDT","baseCoin":"OLD","quoteCoin":"USDT","status":"offline"}]}"#;
        let response: BitgetResponse<Vec<BitgetSymbol>> = serde_json::from_str(json).unwrap();
        let catalog = catalog_from(response.into_result().unwrap());

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.native_symbol(&TradingPair::new("PAL", "USDT")).unwrap(), "PALUSDT");
    }

    #[test]
    fn ticker_reads_short_price_names() {
        let json = r#"{"code":"00000","msg":"success","data":[
            {"symbol":"PALUSDT","lastPr":"0.0815","bidPr":"0.0814","askPr":"0.0816"}]}"#;
        let response: BitgetResponse<Vec<BitgetTicker>> = serde_json::from_str(json).unwrap();
        let ticker = Ticker::try_from(response.into_result().unwrap().remove(0)).unwrap();

        assert_eq!(
            ticker,
            Ticker {
                last: Some(0.0815),
                bid: Some(0.0814),
                ask: Some(0.0816)
            }
        );
    }

    #[test]
    fn error_code_is_reported() {
        let json = r#"{"code":"40034","msg":"Parameter does not exist","data":null}"#;
        let response: BitgetResponse<BitgetOrderBook> = serde_json::from_str(json).unwrap();
        match response.into_result() {
            Err(ExchangeError::Api { code, .. }) => assert_eq!(code, "40034"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
