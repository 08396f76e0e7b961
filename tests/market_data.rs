use price_panes_wasm::domain::market_data::{
    IndicatorField, MarketDataIngestionService, Signal, StockPayload, Symbol, TimeInterval, TimeKey,
};
use serde_json::json;
use wasm_bindgen_test::*;

fn ingest(interval: TimeInterval, body: serde_json::Value) -> price_panes_wasm::domain::market_data::MarketSnapshot {
    let payload: StockPayload = serde_json::from_value(body).unwrap();
    MarketDataIngestionService::new(interval).ingest(payload)
}

#[wasm_bindgen_test]
fn rows_become_sorted_unique_candles() {
    let snapshot = ingest(
        TimeInterval::OneDay,
        json!({"price_data": [
            {"Date": "2024-03-08", "Open": 10, "High": 12, "Low": 9, "Close": 11, "Volume": 100},
            {"Date": "2024-03-07", "Open": 9, "High": 10, "Low": 8, "Close": 10, "Volume": 80},
            {"Date": "2024-03-08", "Open": 10, "High": 12, "Low": 9, "Close": 11, "Volume": 100},
        ]}),
    );
    assert_eq!(snapshot.candles.len(), 2);
    assert_eq!(snapshot.candles[0].time.to_string(), "2024-03-07");
    assert_eq!(snapshot.last_close(), Some(11.0));
    assert!(snapshot.candles[1].is_bullish());
}

#[wasm_bindgen_test]
fn malformed_rows_are_skipped_not_fatal() {
    let snapshot = ingest(
        TimeInterval::OneDay,
        json!({"price_data": [
            {"Date": "not a date", "Open": 1, "High": 1, "Low": 1, "Close": 1},
            {"Open": 1, "High": 1, "Low": 1, "Close": 1},
            {"Date": "2024-03-07", "Open": "x", "High": 1, "Low": 1, "Close": 1, "MA20": 5.5},
            {"Date": "2024-03-08", "Open": 1, "High": 2, "Low": 0.5, "Close": "1.5"},
        ]}),
    );
    assert_eq!(snapshot.candles.len(), 1);
    assert_eq!(snapshot.candles[0].close, 1.5);
    assert_eq!(snapshot.candles[0].volume, 0.0);
    assert_eq!(snapshot.indicators.get(IndicatorField::Ma20).len(), 1);
}

#[wasm_bindgen_test]
fn intraday_rows_use_unix_seconds() {
    let snapshot = ingest(
        TimeInterval::OneHour,
        json!({"price_data": [
            {"Date": "2023-11-14T22:13:20", "Open": 1, "High": 1, "Low": 1, "Close": 1},
            {"index": 1_700_003_600_000_i64, "Open": 1, "High": 1, "Low": 1, "Close": 1},
        ]}),
    );
    let times: Vec<TimeKey> = snapshot.candles.iter().map(|c| c.time).collect();
    assert_eq!(times, vec![TimeKey::Unix(1_700_000_000), TimeKey::Unix(1_700_003_600)]);
}

#[wasm_bindgen_test]
fn signal_columns_and_patterns_are_extracted() {
    let snapshot = ingest(
        TimeInterval::OneDay,
        json!({
            "price_data": [
                {"Date": "2024-03-07", "Open": 1, "High": 1, "Low": 1, "Close": 1, "NW_SIGNAL": 0},
                {"Date": "2024-03-08", "Open": 1, "High": 1, "Low": 1, "Close": 1, "NW_SIGNAL": 1,
                 "AI_PATTERN_LABEL": "Double Bottom", "AI_PATTERN_TYPE": 1, "AI_PATTERN_CONF": 87.5},
                {"Date": "2024-03-11", "Open": 1, "High": 1, "Low": 1, "Close": 1, "NW_SIGNAL": -1,
                 "AI_PATTERN_LABEL": ""},
            ],
            "fundamental": {"pe": 4.2},
            "correlation": null
        }),
    );

    let signals = snapshot.indicators.signals(IndicatorField::NwSignal);
    assert_eq!(signals.len(), 2);
    assert_eq!(signals[0].signal, Signal::Buy);
    assert_eq!(signals[1].signal, Signal::Sell);

    assert_eq!(snapshot.patterns.len(), 1);
    let pattern = snapshot.pattern_at(signals[0].time).expect("pattern on the buy bar");
    assert_eq!(pattern.label, "Double Bottom");
    assert_eq!(pattern.confidence, Some(87.5));
    assert!(snapshot.fundamental.is_some());
    assert!(snapshot.correlation.is_none());
}

#[wasm_bindgen_test]
fn missing_price_data_yields_empty_snapshot() {
    let snapshot = ingest(TimeInterval::OneDay, json!({"fundamental": null}));
    assert!(snapshot.is_empty());
    assert!(snapshot.indicators.is_empty());
}

#[wasm_bindgen_test]
fn bare_tickers_get_exchange_suffix() {
    assert_eq!(Symbol::from("thyao").normalized().value(), "THYAO.IS");
    assert_eq!(Symbol::from("EURUSD=X").normalized().value(), "EURUSD=X");
    assert_eq!(Symbol::from("AAPL.US").normalized().value(), "AAPL.US");
    assert_eq!(Symbol::from("THYAO.IS").display_name(), "THYAO");
    assert!(Symbol::new("   ".to_string()).is_err());
}
