use tracing::warn;

use crate::data_sources::output_data_format::{OrderBook, Ticker};

/// ±2% around the last price.
pub const DEFAULT_DEPTH_BAND: f64 = 0.02;

/// Quote-currency notional resting within the band on each side, and the
/// best bid/ask spread as a percentage of the best ask.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepthMetrics {
    pub bid_depth: f64,
    pub ask_depth: f64,
    pub spread_pct: Option<f64>,
}

pub fn calculate_depth_metrics(
    order_book: Option<&OrderBook>,
    ticker: Option<&Ticker>,
    band: f64,
) -> DepthMetrics {
    let (Some(order_book), Some(ticker)) = (order_book, ticker) else {
        return DepthMetrics::default();
    };

    let price = match ticker.last {
        Some(price) if price.is_finite() && price > 0.0 => price,
        _ => return DepthMetrics::default(),
    };

    if order_book.is_empty() {
        return DepthMetrics::default();
    }

    let lower_band = price * (1.0 - band);
    let upper_band = price * (1.0 + band);

    // bids must be highest first, asks lowest first
    let bid_depth = depth_within_band(
        "bids",
        &order_book.bids,
        |level_price| level_price >= lower_band,
        |previous, next| previous >= next,
    );
    let ask_depth = depth_within_band(
        "asks",
        &order_book.asks,
        |level_price| level_price <= upper_band,
        |previous, next| previous <= next,
    );

    DepthMetrics {
        bid_depth,
        ask_depth,
        spread_pct: spread_percentage(ticker.bid, ticker.ask),
    }
}

/// Early-exit scan from the top of the book. A side that is not in the
/// expected order is summed with a full scan instead, so out-of-order levels
/// are never silently dropped.
fn depth_within_band(
    side: &str,
    levels: &[(f64, f64)],
    in_band: impl Fn(f64) -> bool,
    in_order: impl Fn(f64, f64) -> bool,
) -> f64 {
    let sorted = levels
        .windows(2)
        .all(|pair| in_order(pair[0].0, pair[1].0));

    if sorted {
        levels
            .iter()
            .take_while(|(price, _)| in_band(*price))
            .map(|&(price, amount)| notional(price, amount))
            .sum()
    } else {
        warn!(side, levels = levels.len(), "order book side is not sorted, using a full scan");
        levels
            .iter()
            .filter(|(price, _)| in_band(*price))
            .map(|&(price, amount)| notional(price, amount))
            .sum()
    }
}

fn notional(price: f64, amount: f64) -> f64 {
    if price.is_finite() && amount.is_finite() && price > 0.0 && amount > 0.0 {
        price * amount
    } else {
        0.0
    }
}

/// Rounded to two decimal places.
pub fn spread_percentage(best_bid: Option<f64>, best_ask: Option<f64>) -> Option<f64> {
    let (bid, ask) = (best_bid?, best_ask?);
    if !bid.is_finite() || !ask.is_finite() || ask <= 0.0 {
        return None;
    }

    let spread = (ask - bid) / ask * 100.0;
    Some((spread * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(last: f64) -> Ticker {
        Ticker {
            last: Some(last),
            bid: None,
            ask: None,
        }
    }

    fn sample_book() -> OrderBook {
        OrderBook::new(
            vec![(100.0, 1.0), (99.0, 2.0), (95.0, 3.0)],
            vec![(101.0, 1.0), (103.0, 2.0), (110.0, 5.0)],
        )
    }

    #[test]
    fn sums_levels_inside_two_percent_band() {
        let metrics =
            calculate_depth_metrics(Some(&sample_book()), Some(&ticker(100.0)), DEFAULT_DEPTH_BAND);

        assert!((metrics.bid_depth - 298.0).abs() < 1e-9);
        assert!((metrics.ask_depth - 101.0).abs() < 1e-9);
        assert_eq!(metrics.spread_pct, None);
    }

    #[test]
    fn band_edges_are_inclusive() {
        let book = OrderBook::new(vec![(98.0, 1.0)], vec![(102.0, 1.0)]);
        let metrics = calculate_depth_metrics(Some(&book), Some(&ticker(100.0)), 0.02);

        assert!((metrics.bid_depth - 98.0).abs() < 1e-9);
        assert!((metrics.ask_depth - 102.0).abs() < 1e-9);
    }

    #[test]
    fn spread_is_percentage_of_best_ask() {
        let ticker = Ticker {
            last: Some(100.0),
            bid: Some(99.5),
            ask: Some(100.0),
        };
        let metrics = calculate_depth_metrics(Some(&sample_book()), Some(&ticker), 0.02);

        let spread = metrics.spread_pct.unwrap();
        assert!((spread - 0.50).abs() < 1e-9);
    }

    #[test]
    fn spread_rounds_to_two_decimals() {
        assert_eq!(spread_percentage(Some(2.0), Some(3.0)), Some(33.33));
        assert_eq!(spread_percentage(Some(99.0), Some(0.0)), None);
        assert_eq!(spread_percentage(None, Some(3.0)), None);
        assert_eq!(spread_percentage(Some(2.0), None), None);
    }

    #[test]
    fn missing_inputs_yield_empty_metrics() {
        let empty = DepthMetrics::default();
        let book = sample_book();

        assert_eq!(calculate_depth_metrics(None, Some(&ticker(100.0)), 0.02), empty);
        assert_eq!(calculate_depth_metrics(Some(&book), None, 0.02), empty);
        assert_eq!(
            calculate_depth_metrics(Some(&OrderBook::default()), Some(&ticker(100.0)), 0.02),
            empty
        );

        let no_price = Ticker {
            last: None,
            bid: Some(99.0),
            ask: Some(100.0),
        };
        assert_eq!(calculate_depth_metrics(Some(&book), Some(&no_price), 0.02), empty);
        assert_eq!(calculate_depth_metrics(Some(&book), Some(&ticker(0.0)), 0.02), empty);
        assert_eq!(calculate_depth_metrics(Some(&book), Some(&ticker(-5.0)), 0.02), empty);
        assert_eq!(calculate_depth_metrics(Some(&book), Some(&ticker(f64::NAN)), 0.02), empty);
    }

    #[test]
    fn scan_stops_at_first_level_outside_band() {
        // sorted, so the scan ends at 97 and never reaches a later level
        let book = OrderBook::new(vec![(100.0, 1.0), (97.0, 1.0), (96.0, 1.0)], vec![]);
        let metrics = calculate_depth_metrics(Some(&book), Some(&ticker(100.0)), 0.02);
        assert!((metrics.bid_depth - 100.0).abs() < 1e-9);
        assert_eq!(metrics.ask_depth, 0.0);
    }

    #[test]
    fn unsorted_side_falls_back_to_full_scan() {
        let book = OrderBook::new(
            vec![(100.0, 1.0), (95.0, 3.0), (99.0, 2.0)],
            vec![(110.0, 5.0), (101.0, 1.0)],
        );
        let metrics = calculate_depth_metrics(Some(&book), Some(&ticker(100.0)), 0.02);

        assert!((metrics.bid_depth - 298.0).abs() < 1e-9);
        assert!((metrics.ask_depth - 101.0).abs() < 1e-9);
    }

    #[test]
    fn depth_is_never_negative() {
        let book = OrderBook::new(
            vec![(100.0, -4.0), (99.5, f64::NAN), (99.0, 1.0)],
            vec![(100.5, -1.0), (101.0, 2.0)],
        );
        let metrics = calculate_depth_metrics(Some(&book), Some(&ticker(100.0)), 0.02);

        assert!((metrics.bid_depth - 99.0).abs() < 1e-9);
        assert!((metrics.ask_depth - 202.0).abs() < 1e-9);
    }

    #[test]
    fn wider_band_covers_more_levels() {
        let metrics = calculate_depth_metrics(Some(&sample_book()), Some(&ticker(100.0)), 0.10);
        assert!((metrics.bid_depth - (298.0 + 285.0)).abs() < 1e-9);
        assert!((metrics.ask_depth - (101.0 + 206.0 + 550.0)).abs() < 1e-9);
    }
}
