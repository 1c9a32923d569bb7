use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};

use crate::snapshot::{group_by_pair, Record, Settings, Status};

fn clear_terminal() {
    println!("{}c", 27 as char);
}

pub fn print_snapshot_as_tables(records: &[Record], settings: &Settings) {
    clear_terminal();

    if records.is_empty() {
        println!("No exchange returned data. Check the configured pairs.");
        return;
    }

    println!(
        "Depth within ±{}% of last price, alert below {}",
        settings.depth_band_pct,
        format_depth(settings.alert_threshold)
    );
    for (symbol, table) in snapshot_tables(records, settings) {
        println!("{}", symbol);
        println!("{}", table);
    }
}

fn snapshot_tables(records: &[Record], settings: &Settings) -> Vec<(String, Table)> {
    group_by_pair(records)
        .into_iter()
        .map(|(symbol, rows)| (symbol.to_string(), pair_table(&rows, settings)))
        .collect()
}

fn pair_table(rows: &[&Record], settings: &Settings) -> Table {
    let band = settings.depth_band_pct;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Exchange"),
            Cell::new("Price"),
            Cell::new(format!("-{}% Bid Depth", band)),
            Cell::new(format!("+{}% Ask Depth", band)),
            Cell::new("Spread"),
        ]);

    for row in rows {
        match row.status {
            Status::NotListed => continue,
            Status::Error => {
                table.add_row(vec![
                    Cell::new(&row.exchange),
                    Cell::new(error_label(row.error.as_deref())).fg(Color::DarkGrey),
                ]);
            }
            Status::Active => {
                let price = row.price.map_or("-".to_string(), |price| format!("${}", price));
                let spread = row
                    .spread
                    .map_or("-".to_string(), |spread| format!("{:.2}%", spread));
                table.add_row(vec![
                    Cell::new(&row.exchange),
                    Cell::new(price),
                    depth_cell(row.bid_depth, settings.alert_threshold),
                    depth_cell(row.ask_depth, settings.alert_threshold),
                    Cell::new(spread),
                ]);
            }
        }
    }

    table
}

/// Human wording for the server's error kind.
fn error_label(kind: Option<&str>) -> &'static str {
    match kind {
        Some("timeout") => "timed out",
        Some("rate_limited") => "rate limited",
        Some("network") => "network error",
        Some("exchange") => "exchange error",
        Some("malformed") => "malformed response",
        _ => "request failed",
    }
}

fn depth_cell(depth: f64, threshold: f64) -> Cell {
    let color = if depth < threshold { Color::Red } else { Color::Green };
    Cell::new(format_depth(depth)).fg(color)
}

/// Whole quote units with thousands separators, e.g. `12,345`.
pub fn format_depth(depth: f64) -> String {
    if !depth.is_finite() || depth <= 0.0 {
        return "0".to_string();
    }

    let digits = (depth.trunc() as u64).to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    formatted
}
