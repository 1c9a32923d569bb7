use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ExchangeError;

/// A `BASE/QUOTE` trading pair, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradingPair {
    base: String,
    quote: String,
}

impl TradingPair {
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            base: base.trim().to_uppercase(),
            quote: quote.trim().to_uppercase(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl FromStr for TradingPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((base, quote)) if !base.trim().is_empty() && !quote.trim().is_empty() => {
                Ok(TradingPair::new(base, quote))
            }
            _ => Err(format!("expected BASE/QUOTE, got {:?}", s)),
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl Serialize for TradingPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Unified order book format
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBook {
    pub bids: Vec<(f64, f64)>, // price, amount; highest price first
    pub asks: Vec<(f64, f64)>, // price, amount; lowest price first
}

impl OrderBook {
    pub fn new(bids: Vec<(f64, f64)>, asks: Vec<(f64, f64)>) -> Self {
        Self { bids, asks }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn truncate(&mut self, depth: usize) {
        self.bids.truncate(depth);
        self.asks.truncate(depth);
    }
}

/// Unified ticker format. Every field is absent when the exchange has no
/// recent trade or quote.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ticker {
    pub last: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
}

/// The pairs an exchange lists, each with the symbol the exchange uses for
/// it on the wire.
#[derive(Debug, Clone, Default)]
pub struct MarketCatalog {
    markets: HashMap<TradingPair, String>,
}

impl MarketCatalog {
    pub fn contains(&self, pair: &TradingPair) -> bool {
        self.markets.contains_key(pair)
    }

    pub fn native_symbol(&self, pair: &TradingPair) -> Result<&str, ExchangeError> {
        self.markets
            .get(pair)
            .map(String::as_str)
            .ok_or_else(|| ExchangeError::UnknownMarket(pair.to_string()))
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

impl FromIterator<(TradingPair, String)> for MarketCatalog {
    fn from_iter<I: IntoIterator<Item = (TradingPair, String)>>(iter: I) -> Self {
        Self {
            markets: iter.into_iter().collect(),
        }
    }
}

/// A number as exchanges send it: a decimal string or a JSON number.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum RawNumber {
    Text(String),
    Number(f64),
}

impl RawNumber {
    pub fn to_f64(&self) -> Result<f64, ExchangeError> {
        match self {
            RawNumber::Number(value) => Ok(*value),
            RawNumber::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| ExchangeError::malformed(format!("invalid number {:?}", text))),
        }
    }
}

pub type RawLevel = (RawNumber, RawNumber);

pub fn parse_levels(levels: &[RawLevel]) -> Result<Vec<(f64, f64)>, ExchangeError> {
    levels
        .iter()
        .map(|(price, amount)| Ok((price.to_f64()?, amount.to_f64()?)))
        .collect()
}

/// Optional ticker field. Exchanges use `null` or `""` for "no quote".
pub fn parse_optional_price(value: Option<&RawNumber>) -> Result<Option<f64>, ExchangeError> {
    match value {
        None => Ok(None),
        Some(RawNumber::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(raw) => raw.to_f64().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trading_pair_parses_and_normalizes_case() {
        let pair: TradingPair = "xter/usdt".parse().unwrap();
        assert_eq!(pair.to_string(), "XTER/USDT");
        assert_eq!((pair.base(), pair.quote()), ("XTER", "USDT"));
        assert!("XTERUSDT".parse::<TradingPair>().is_err());
        assert!("/USDT".parse::<TradingPair>().is_err());
    }

    #[test]
    fn trading_pair_serializes_as_string() {
        let pair = TradingPair::new("pal", "usdt");
        assert_eq!(serde_json::to_string(&pair).unwrap(), r#""PAL/USDT""#);
    }

    #[test]
    fn levels_accept_strings_and_numbers() {
        let raw: Vec<RawLevel> = serde_json::from_str(r#"[["100.5","2"],[99.5,3.25]]"#).unwrap();
        assert_eq!(parse_levels(&raw).unwrap(), vec![(100.5, 2.0), (99.5, 3.25)]);
    }

    #[test]
    fn bad_level_is_malformed_not_panic() {
        let raw: Vec<RawLevel> = serde_json::from_str(r#"[["abc","2"]]"#).unwrap();
        assert!(matches!(parse_levels(&raw), Err(ExchangeError::Malformed(_))));
    }

    #[test]
    fn catalog_resolves_native_symbols() {
        let catalog: MarketCatalog = [(TradingPair::new("XTER", "USDT"), "XTER_USDT".to_string())]
            .into_iter()
            .collect();

        assert_eq!(catalog.native_symbol(&TradingPair::new("XTER", "USDT")).unwrap(), "XTER_USDT");
        assert!(matches!(
            catalog.native_symbol(&TradingPair::new("PAL", "USDT")),
            Err(ExchangeError::UnknownMarket(symbol)) if symbol == "PAL/USDT"
        ));
    }

    #[test]
    fn empty_ticker_field_is_absent() {
        let empty = RawNumber::Text(String::new());
        assert_eq!(parse_optional_price(Some(&empty)).unwrap(), None);
        assert_eq!(parse_optional_price(None).unwrap(), None);
        let price = RawNumber::Text("0.0123".to_string());
        assert_eq!(parse_optional_price(Some(&price)).unwrap(), Some(0.0123));
    }
}
