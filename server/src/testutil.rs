//! Shared test fixtures: a scriptable in-memory exchange and config builders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::data_sources::output_data_format::{MarketCatalog, OrderBook, Ticker, TradingPair};
use crate::data_sources::ExchangeClient;
use crate::error::ExchangeError;
use crate::summary::CollectorConfig;

pub(crate) fn pair(symbol: &str) -> TradingPair {
    symbol.parse().unwrap()
}

pub(crate) fn collector_config(pairs: &[&str], max_workers: usize) -> CollectorConfig {
    CollectorConfig {
        pairs: pairs.iter().map(|symbol| pair(symbol)).collect(),
        max_workers,
        ..CollectorConfig::default()
    }
}

/// Book and ticker every healthy mock pair returns: 298 of bid depth, 101
/// of ask depth and a 0.5% spread around a last price of 100.
pub(crate) fn sample_book() -> OrderBook {
    OrderBook::new(
        vec![(100.0, 1.0), (99.0, 2.0), (95.0, 3.0)],
        vec![(101.0, 1.0), (103.0, 2.0), (110.0, 5.0)],
    )
}

pub(crate) fn sample_ticker() -> Ticker {
    Ticker {
        last: Some(100.0),
        bid: Some(99.5),
        ask: Some(100.0),
    }
}

/// How a mock misbehaves for one pair.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    RateLimited,
    /// Never answers the order-book request.
    Stall,
    NoLastPrice,
    Panic,
}

/// Tracks how many mock calls run at the same time.
#[derive(Default)]
pub(crate) struct InFlight {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl InFlight {
    pub(crate) fn max(&self) -> usize {
        self.max.load(SeqCst)
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, SeqCst) + 1;
        self.max.fetch_max(now, SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, SeqCst);
    }
}

pub(crate) struct MockExchange {
    name: &'static str,
    listed: Vec<TradingPair>,
    catalog_fails: bool,
    faults: HashMap<TradingPair, Fault>,
    latency: Duration,
    in_flight: Option<Arc<InFlight>>,
    catalog_loads: AtomicUsize,
    ticker_calls: AtomicUsize,
}

impl MockExchange {
    pub(crate) fn new(name: &'static str, listed: &[&str]) -> Self {
        Self {
            name,
            listed: listed.iter().map(|symbol| pair(symbol)).collect(),
            catalog_fails: false,
            faults: HashMap::new(),
            latency: Duration::ZERO,
            in_flight: None,
            catalog_loads: AtomicUsize::new(0),
            ticker_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing_catalog(mut self) -> Self {
        self.catalog_fails = true;
        self
    }

    pub(crate) fn with_fault(mut self, symbol: &str, fault: Fault) -> Self {
        self.faults.insert(pair(symbol), fault);
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn with_in_flight(mut self, in_flight: Arc<InFlight>) -> Self {
        self.in_flight = Some(in_flight);
        self
    }

    pub(crate) fn catalog_loads(&self) -> usize {
        self.catalog_loads.load(SeqCst)
    }

    pub(crate) fn ticker_calls(&self) -> usize {
        self.ticker_calls.load(SeqCst)
    }

    async fn call(&self) {
        if let Some(in_flight) = &self.in_flight {
            in_flight.enter();
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(in_flight) = &self.in_flight {
            in_flight.leave();
        }
    }
}

#[async_trait]
impl ExchangeClient for MockExchange {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn load_markets(&self) -> Result<Arc<MarketCatalog>, ExchangeError> {
        self.catalog_loads.fetch_add(1, SeqCst);
        self.call().await;

        if self.catalog_fails {
            return Err(ExchangeError::Status {
                status: 503,
                body: "maintenance".to_string(),
            });
        }

        let catalog = self
            .listed
            .iter()
            .map(|pair| (pair.clone(), format!("{}{}", pair.base(), pair.quote())))
            .collect();
        Ok(Arc::new(catalog))
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<Ticker, ExchangeError> {
        self.ticker_calls.fetch_add(1, SeqCst);
        self.call().await;

        match self.faults.get(pair) {
            Some(Fault::RateLimited) => Err(ExchangeError::RateLimited),
            Some(Fault::NoLastPrice) => Ok(Ticker {
                last: None,
                ..sample_ticker()
            }),
            Some(Fault::Panic) => panic!("injected panic for {}", pair),
            _ => Ok(sample_ticker()),
        }
    }

    async fn fetch_order_book(
        &self,
        pair: &TradingPair,
        limit: u16,
    ) -> Result<OrderBook, ExchangeError> {
        self.call().await;

        if let Some(Fault::Stall) = self.faults.get(pair) {
            std::future::pending::<()>().await;
        }

        let mut book = sample_book();
        book.truncate(limit as usize);
        Ok(book)
    }
}
