use chrono::NaiveDate;
use insta::assert_json_snapshot;
use price_panes_wasm::domain::chart::DomainPoint;
use price_panes_wasm::domain::drawing::{Drawing, DrawingId, DrawingKind};
use price_panes_wasm::domain::market_data::TimeKey;
use wasm_bindgen_test::*;

fn day(y: i32, m: u32, d: u32) -> TimeKey {
    TimeKey::Day(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

#[wasm_bindgen_test]
fn stored_drawing_shape() {
    let mut drawing = Drawing::started_at(
        DrawingId(1_717_000_000_000),
        DrawingKind::Fibonacci,
        DomainPoint::new(day(2024, 3, 7), 102.5),
    );
    drawing.p2 = DomainPoint::new(day(2024, 4, 1), 88.25);

    assert_json_snapshot!(drawing, @r###"
    {
      "id": 1717000000000,
      "type": "fib",
      "p1": {
        "time": "2024-03-07",
        "price": 102.5
      },
      "p2": {
        "time": "2024-04-01",
        "price": 88.25
      },
      "color": "#ff9800"
    }
    "###);
}

#[wasm_bindgen_test]
fn intraday_drawing_keeps_unix_seconds() {
    let mut drawing =
        Drawing::started_at(DrawingId(5), DrawingKind::HorizontalLine, DomainPoint::new(TimeKey::Unix(1_700_000_000), 12.5));
    drawing.color = "#ef5350".to_string();

    assert_json_snapshot!(drawing, @r###"
    {
      "id": 5,
      "type": "hline",
      "p1": {
        "time": 1700000000,
        "price": 12.5
      },
      "p2": {
        "time": 1700000000,
        "price": 12.5
      },
      "color": "#ef5350"
    }
    "###);
}

#[wasm_bindgen_test]
fn stored_lists_with_string_ids_and_date_keys_load() {
    let body = r##"[
        {"id": "1717000000000", "type": "trend",
         "p1": {"time": "2024-03-07", "price": 10},
         "p2": {"time": {"year": 2024, "month": 3, "day": 8}, "price": 11.5}},
        {"id": 42.0, "type": "box", "color": "#00c853",
         "p1": {"time": 1700000000, "price": 1},
         "p2": {"time": 1700003600, "price": 2}}
    ]"##;
    let drawings: Vec<Drawing> = serde_json::from_str(body).unwrap();

    assert_eq!(drawings.len(), 2);
    assert_eq!(drawings[0].id, DrawingId(1_717_000_000_000));
    assert_eq!(drawings[0].kind, DrawingKind::TrendLine);
    assert_eq!(drawings[0].p1.time, day(2024, 3, 7));
    assert_eq!(drawings[0].p2.time, day(2024, 3, 8));
    assert_eq!(drawings[0].color, "#2962ff");
    assert_eq!(drawings[1].id, DrawingId(42));
    assert_eq!(drawings[1].p2.time, TimeKey::Unix(1_700_003_600));
}

#[wasm_bindgen_test]
fn unknown_shape_type_is_rejected() {
    let body = r#"{"id": 1, "type": "circle", "p1": {"time": 1, "price": 1}, "p2": {"time": 2, "price": 2}}"#;
    assert!(serde_json::from_str::<Drawing>(body).is_err());
}
