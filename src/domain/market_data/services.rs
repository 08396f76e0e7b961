use super::entities::{AiPattern, Candle, IndicatorField, IndicatorSet, MarketSnapshot, SeriesPoint};
use super::value_objects::{TimeInterval, TimeKey};
use crate::domain::logging::{LogComponent, get_logger};
use serde::Deserialize;
use serde_json::{Map, Value};
use strum::IntoEnumIterator;

/// Response body of `GET /stock/{symbol}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockPayload {
    #[serde(default)]
    pub price_data: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub fundamental: Option<Value>,
    #[serde(default)]
    pub correlation: Option<Value>,
}

/// Доменный сервис нормализации ответа API.
///
/// Bad rows and non-finite values are dropped, never reported as failures,
/// so a chart always renders whatever partial series survive.
pub struct MarketDataIngestionService {
    interval: TimeInterval,
}

impl MarketDataIngestionService {
    pub fn new(interval: TimeInterval) -> Self {
        Self { interval }
    }

    pub fn ingest(&self, payload: StockPayload) -> MarketSnapshot {
        let rows = payload.price_data.unwrap_or_default();
        let mut candles = Vec::with_capacity(rows.len());
        let mut indicators = IndicatorSet::new();
        let mut patterns = Vec::new();
        let mut skipped = 0usize;

        for row in &rows {
            let Some(time) = self.row_time(row) else {
                skipped += 1;
                continue;
            };

            if let Some(candle) = Self::row_candle(row, time) {
                candles.push(candle);
            } else {
                skipped += 1;
            }

            for field in IndicatorField::iter() {
                if let Some(value) = row.get(field.column()).and_then(numeric) {
                    indicators.push(field, SeriesPoint::new(time, value));
                }
            }

            if let Some(label) = row.get("AI_PATTERN_LABEL").and_then(Value::as_str).filter(|l| !l.is_empty()) {
                patterns.push(AiPattern {
                    time,
                    label: label.to_string(),
                    kind: row.get("AI_PATTERN_TYPE").and_then(numeric).map(|v| v as i64).unwrap_or(0),
                    confidence: row.get("AI_PATTERN_CONF").and_then(numeric),
                });
            }
        }

        candles.sort_by(|a, b| a.time.cmp(&b.time));
        candles.dedup_by(|later, earlier| later.time == earlier.time);
        indicators.normalize();
        patterns.sort_by(|a, b| a.time.cmp(&b.time));

        if skipped > 0 {
            get_logger().debug(
                LogComponent::Domain("MarketDataIngestion"),
                &format!("Skipped {} malformed rows out of {}", skipped, rows.len()),
            );
        }

        MarketSnapshot {
            candles,
            indicators,
            patterns,
            fundamental: payload.fundamental.filter(|v| !v.is_null()),
            correlation: payload.correlation.filter(|v| !v.is_null()),
        }
    }

    fn row_time(&self, row: &Map<String, Value>) -> Option<TimeKey> {
        let raw = ["Date", "index", "date"]
            .iter()
            .filter_map(|key| row.get(*key))
            .find(|v| !v.is_null())?;
        match raw {
            Value::String(text) => TimeKey::parse(text, self.interval),
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).and_then(|ms| TimeKey::from_millis(ms as i64, self.interval)),
            _ => None,
        }
    }

    fn row_candle(row: &Map<String, Value>, time: TimeKey) -> Option<Candle> {
        let field = |name: &str| row.get(name).and_then(numeric);
        let candle = Candle::new(
            time,
            field("Open")?,
            field("High")?,
            field("Low")?,
            field("Close")?,
            field("Volume").filter(|v| *v >= 0.0).unwrap_or(0.0),
        );
        candle.is_finite().then_some(candle)
    }
}

/// Loose numeric coercion: numbers and numeric strings, finite only.
fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(rows: Value) -> StockPayload {
        serde_json::from_value(json!({ "price_data": rows })).unwrap()
    }

    #[test]
    fn daily_rows_use_calendar_dates() {
        let service = MarketDataIngestionService::new(TimeInterval::OneDay);
        let snapshot = service.ingest(payload(json!([
            {"Date": "2024-01-03T00:00:00", "Open": 1, "High": 2, "Low": 0.5, "Close": 1.5, "Volume": 10},
            {"Date": "2024-01-02T00:00:00", "Open": 1, "High": 2, "Low": 0.5, "Close": 1.5, "Volume": 10},
        ])));
        assert_eq!(snapshot.candles.len(), 2);
        assert_eq!(snapshot.candles[0].time.to_string(), "2024-01-02");
    }

    #[test]
    fn non_finite_indicator_values_are_dropped() {
        let service = MarketDataIngestionService::new(TimeInterval::OneHour);
        let snapshot = service.ingest(payload(json!([
            {"Date": "2024-01-02T10:00:00", "Open": 1, "High": 2, "Low": 0.5, "Close": 1.5, "RSI": null},
            {"Date": "2024-01-02T11:00:00", "Open": 1, "High": 2, "Low": 0.5, "Close": 1.5, "RSI": "NaN"},
            {"Date": "2024-01-02T12:00:00", "Open": 1, "High": 2, "Low": 0.5, "Close": 1.5, "RSI": 55.5},
        ])));
        assert_eq!(snapshot.indicators.get(IndicatorField::Rsi).len(), 1);
    }
}
