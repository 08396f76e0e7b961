use chrono::DateTime;

use crate::domain::market_data::TimeKey;

/// Legend label for a time key, UTC.
///
/// - calendar keys -> `DD.MM.YYYY`
/// - intraday keys -> `DD.MM.YYYY HH:MM`
pub fn format_time_key(key: TimeKey) -> String {
    match key {
        TimeKey::Day(date) => date.format("%d.%m.%Y").to_string(),
        TimeKey::Unix(seconds) => match DateTime::from_timestamp(seconds, 0) {
            Some(dt) => dt.format("%d.%m.%Y %H:%M").to_string(),
            None => seconds.to_string(),
        },
    }
}

/// Compact price label: two decimals, four below 1.
pub fn format_price(value: f64) -> String {
    if value.abs() < 1.0 { format!("{:.4}", value) } else { format!("{:.2}", value) }
}
