//! Error types for exchange access and collection cycles.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Failure of a single call against an exchange's public REST API.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rate limited by exchange")]
    RateLimited,

    #[error("exchange API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("{0} is not in the exchange's market list")]
    UnknownMarket(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ExchangeError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ExchangeError::Malformed(message.into())
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            ExchangeError::Http(error) if error.is_timeout() => FetchErrorKind::Timeout,
            ExchangeError::Http(error) if error.is_decode() => FetchErrorKind::Malformed,
            ExchangeError::Http(_) | ExchangeError::Url(_) => FetchErrorKind::Network,
            ExchangeError::Status { .. }
            | ExchangeError::Api { .. }
            | ExchangeError::UnknownMarket(_) => FetchErrorKind::Exchange,
            ExchangeError::RateLimited => FetchErrorKind::RateLimited,
            ExchangeError::Malformed(_) => FetchErrorKind::Malformed,
            ExchangeError::Timeout(_) => FetchErrorKind::Timeout,
        }
    }
}

/// What went wrong for a pair reported with `status = Error`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    Timeout,
    RateLimited,
    Network,
    Exchange,
    Malformed,
}

/// Failure of a whole collection cycle. Per-pair and per-exchange failures
/// never end up here; they are folded into the records.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("collector worker failed: {0}")]
    WorkerFailed(#[from] tokio::task::JoinError),
}
