use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    #[serde(rename = "Not Listed")]
    NotListed,
    Error,
}

/// One row of `/api/data`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    pub exchange: String,
    pub symbol: String,
    pub status: Status,
    pub price: Option<f64>,
    pub bid_depth: f64,
    pub ask_depth: f64,
    pub spread: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `/api/config`, fetched once at start-up.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    pub alert_threshold: f64,
    pub depth_band_pct: f64,
    pub refresh_interval_ms: u64,
}

/// Pairs in order of first appearance, each with its rows.
pub fn group_by_pair(records: &[Record]) -> Vec<(&str, Vec<&Record>)> {
    let mut groups: Vec<(&str, Vec<&Record>)> = Vec::new();

    for record in records {
        match groups.iter_mut().find(|(symbol, _)| *symbol == record.symbol) {
            Some((_, rows)) => rows.push(record),
            None => groups.push((record.symbol.as_str(), vec![record])),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_server_records() {
        let records: Vec<Record> = serde_json::from_str(
            r#"[
                {"exchange":"BYBIT","symbol":"XTER/USDT","status":"Active","price":0.42,
                 "bid_depth":5120.5,"ask_depth":880.0,"spread":0.31},
                {"exchange":"HTX","symbol":"XTER/USDT","status":"Not Listed","price":null,
                 "bid_depth":0.0,"ask_depth":0.0,"spread":null},
                {"exchange":"MEXC","symbol":"PAL/USDT","status":"Error","price":null,
                 "bid_depth":0.0,"ask_depth":0.0,"spread":null,"error":"timeout"}
            ]"#,
        )
        .unwrap();

        assert_eq!(records[0].status, Status::Active);
        assert_eq!(records[0].spread, Some(0.31));
        assert_eq!(records[1].status, Status::NotListed);
        assert_eq!(records[1].error, None);
        assert_eq!(records[2].error.as_deref(), Some("timeout"));
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let record = |exchange: &str, symbol: &str| Record {
            exchange: exchange.to_string(),
            symbol: symbol.to_string(),
            status: Status::Active,
            price: Some(1.0),
            bid_depth: 0.0,
            ask_depth: 0.0,
            spread: None,
            error: None,
        };
        let records = vec![
            record("BYBIT", "XTER/USDT"),
            record("BYBIT", "PAL/USDT"),
            record("MEXC", "XTER/USDT"),
        ];

        let groups = group_by_pair(&records);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "XTER/USDT");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1].exchange, "MEXC");
        assert_eq!(groups[1].0, "PAL/USDT");
    }
}
