//! Liquidity monitor for thinly traded pairs across several exchanges.
//!
//! Every refresh polls each exchange's public REST API, reduces the order
//! book around the last price to bid/ask depth, and serves the result as a
//! JSON snapshot next to a small browser dashboard.

pub mod api;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod helpers;
pub mod summary;

#[cfg(test)]
mod testutil;
