use price_panes_wasm::domain::chart::composition::{LinePoint, PaneComposer, PaneRole, SeriesData, SeriesKind, class_lines};
use price_panes_wasm::domain::chart::{IndicatorId, PaneId, SecondaryPane, TrendClass, TrendSegmenter, VisibilityConfig};
use price_panes_wasm::domain::market_data::{
    MarketDataIngestionService, MarketSnapshot, SeriesPoint, Signal, SignalPoint, StockPayload, TimeInterval, TimeKey,
};
use serde_json::{Value, json};
use wasm_bindgen_test::*;

/// Six hourly bars with a sell on bar 3 and a buy on bar 5.
fn snapshot() -> MarketSnapshot {
    let signals = [0, 0, -1, 0, 1, 0];
    let rows: Vec<Value> = (1..=6)
        .map(|i| {
            let close = if i == 4 { 9.5 } else { 11.0 + i as f64 };
            json!({
                "Date": format!("2024-03-07T{:02}:00:00", 9 + i),
                "Open": 10.0 + i as f64, "High": 12.0 + i as f64, "Low": 9.0 + i as f64,
                "Close": close,
                "Volume": 1000 * i,
                "NW_SMOOTH": 10.5 + i as f64,
                "NW_SIGNAL": signals[i - 1],
                "RSI": 40 + i,
                "MACD": 0.5, "MACD_SIGNAL": 0.25 * i as f64
            })
        })
        .collect();
    let payload: StockPayload = serde_json::from_value(json!({ "price_data": rows })).unwrap();
    MarketDataIngestionService::new(TimeInterval::OneHour).ingest(payload)
}

fn hour(i: i64) -> TimeKey {
    // 2024-03-07T09:00:00Z
    TimeKey::Unix(1_709_802_000 + i * 3600)
}

#[wasm_bindgen_test]
fn default_visibility_builds_price_pane_only() {
    let panes = PaneComposer::default().compose(&snapshot(), &VisibilityConfig::default());
    assert_eq!(panes.len(), 1);

    let primary = &panes[0];
    assert_eq!(primary.id, PaneId::PRIMARY);
    assert_eq!(primary.role, PaneRole::Primary);
    assert_eq!(primary.anchor, 0);
    assert_eq!(primary.series[0].kind, SeriesKind::Candlestick);
    assert_eq!(primary.series[0].data.len(), 6);

    let titles: Vec<Option<&str>> = primary.series.iter().map(|s| s.style.title.as_deref()).collect();
    assert_eq!(titles, vec![None, Some("LuxAlgo NW Up"), Some("LuxAlgo NW Down")]);

    let arrows: Vec<&str> = primary.series[0].markers.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(arrows, vec!["S", "B"]);
}

#[wasm_bindgen_test]
fn two_tone_lines_gap_where_the_other_class_rules() {
    let panes = PaneComposer::default().compose(&snapshot(), &VisibilityConfig::default());
    let SeriesData::Line(up) = &panes[0].series[1].data else {
        panic!("rising run is a line");
    };
    let SeriesData::Line(down) = &panes[0].series[2].data else {
        panic!("falling run is a line");
    };

    let up_times: Vec<(TimeKey, bool)> = up.iter().map(|p| (p.time, p.value.is_some())).collect();
    assert_eq!(
        up_times,
        vec![(hour(1), true), (hour(2), true), (hour(3), true), (hour(4), false), (hour(5), true), (hour(6), true)]
    );
    let down_times: Vec<TimeKey> = down.iter().map(|p| p.time).collect();
    assert_eq!(down_times, vec![hour(3), hour(4), hour(5)]);
}

/// `(time, drawn)` pairs of each line.
fn shape_of(lines: &[Vec<LinePoint>]) -> Vec<Vec<(i64, bool)>> {
    lines
        .iter()
        .map(|line| {
            line.iter()
                .map(|p| match p.time {
                    TimeKey::Unix(t) => (t, p.value.is_some()),
                    TimeKey::Day(_) => panic!("unix keys only"),
                })
                .collect()
        })
        .collect()
}

#[wasm_bindgen_test]
fn one_bar_opposite_run_moves_the_class_to_another_line() {
    let source: Vec<SeriesPoint> = (1..=10).map(|t| SeriesPoint::new(TimeKey::Unix(t), t as f64)).collect();
    let signals: Vec<SignalPoint> = [(3, Signal::Sell), (4, Signal::Buy), (6, Signal::Sell), (8, Signal::Buy)]
        .into_iter()
        .map(|(t, signal)| SignalPoint { time: TimeKey::Unix(t), signal })
        .collect();
    let segments = TrendSegmenter::new(TrendClass::Rising).segment(&source, &signals);

    // Rising 1-3, falling 3-4, rising 4-6, falling 6-8, rising 8-10.
    assert_eq!(
        shape_of(&class_lines(&segments, TrendClass::Rising)),
        vec![
            vec![(1, true), (2, true), (3, true)],
            vec![(4, true), (5, true), (6, true), (7, false), (8, true), (9, true), (10, true)],
        ]
    );
    assert_eq!(
        shape_of(&class_lines(&segments, TrendClass::Falling)),
        vec![vec![(3, true), (4, true), (5, false), (6, true), (7, true), (8, true)]]
    );
}

#[wasm_bindgen_test]
fn continuation_lines_are_untitled() {
    let signals = [0, 0, -1, 1, 0, 0];
    let rows: Vec<Value> = (1..=6)
        .map(|i| {
            json!({
                "Date": format!("2024-03-07T{:02}:00:00", 9 + i),
                "Open": 10, "High": 12, "Low": 9, "Close": 11,
                "NW_SMOOTH": 10.0 + i as f64,
                "NW_SIGNAL": signals[i - 1]
            })
        })
        .collect();
    let payload: StockPayload = serde_json::from_value(json!({ "price_data": rows })).unwrap();
    let snapshot = MarketDataIngestionService::new(TimeInterval::OneHour).ingest(payload);

    let panes = PaneComposer::default().compose(&snapshot, &VisibilityConfig::default());
    let titles: Vec<Option<&str>> = panes[0].series.iter().map(|s| s.style.title.as_deref()).collect();
    assert_eq!(titles, vec![None, Some("LuxAlgo NW Up"), None, Some("LuxAlgo NW Down")]);
}

#[wasm_bindgen_test]
fn secondary_panes_follow_fixed_order() {
    let mut visibility = VisibilityConfig::default();
    visibility.set(IndicatorId::Macd, true);
    visibility.set(IndicatorId::Volume, true);
    visibility.set(IndicatorId::Rsi, true);

    let panes = PaneComposer::default().compose(&snapshot(), &visibility);
    let roles: Vec<PaneRole> = panes.iter().map(|p| p.role).collect();
    assert_eq!(
        roles,
        vec![
            PaneRole::Primary,
            PaneRole::Secondary(SecondaryPane::Volume),
            PaneRole::Secondary(SecondaryPane::Rsi),
            PaneRole::Secondary(SecondaryPane::Macd),
        ]
    );
    assert_eq!(panes.iter().map(|p| p.id).collect::<Vec<_>>(), vec![PaneId(0), PaneId(1), PaneId(2), PaneId(3)]);

    let rsi = &panes[2];
    let levels: Vec<f64> = rsi.series[0].price_lines.iter().map(|l| l.price).collect();
    assert_eq!(levels, vec![70.0, 30.0]);

    let macd = &panes[3];
    assert_eq!(macd.anchor, 1);
    assert_eq!(macd.series[0].kind, SeriesKind::Histogram);
    let SeriesData::Histogram(bars) = &macd.series[0].data else {
        panic!("macd histogram");
    };
    assert!((bars[0].value - 0.25).abs() < 1e-9);
    assert!(bars[5].value < 0.0);
}

#[wasm_bindgen_test]
fn volume_bars_take_candle_direction() {
    let mut visibility = VisibilityConfig::default();
    visibility.set(IndicatorId::Volume, true);
    let panes = PaneComposer::default().compose(&snapshot(), &visibility);
    let SeriesData::Histogram(bars) = &panes[1].series[0].data else {
        panic!("volume histogram");
    };
    assert_eq!(bars.len(), 6);
    assert_ne!(bars[3].color, bars[2].color);
    assert_eq!(bars[0].color, bars[2].color);
}

#[wasm_bindgen_test]
fn hidden_elements_are_left_out() {
    let mut visibility = VisibilityConfig::default();
    visibility.set(IndicatorId::Nw, false);
    let panes = PaneComposer::default().compose(&snapshot(), &visibility);
    assert_eq!(panes[0].series.len(), 1);
    assert!(panes[0].series[0].markers.is_empty());
}

#[wasm_bindgen_test]
fn empty_snapshot_still_yields_a_primary_pane() {
    let panes = PaneComposer::default().compose(&MarketSnapshot::default(), &VisibilityConfig::default());
    assert_eq!(panes.len(), 1);
    assert!(panes[0].series[0].data.is_empty());
}
