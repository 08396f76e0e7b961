mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::RecordingFactory;
use price_panes_wasm::application::ChartCoordinator;
use price_panes_wasm::domain::chart::composition::PaneRole;
use price_panes_wasm::domain::chart::legend::HoverReadout;
use price_panes_wasm::domain::chart::{IndicatorId, LogicalRange, ManualFrameScheduler, PaneId, VisibilityConfig};
use price_panes_wasm::domain::events::PaneEventKind;
use price_panes_wasm::domain::market_data::{MarketDataIngestionService, MarketSnapshot, StockPayload, TimeInterval};
use serde_json::json;
use wasm_bindgen_test::*;

fn snapshot() -> Rc<MarketSnapshot> {
    let payload: StockPayload = serde_json::from_value(json!({"price_data": [
        {"Date": "2024-03-07", "Open": 10, "High": 11, "Low": 9, "Close": 10.5, "Volume": 500, "RSI": 48},
        {"Date": "2024-03-08", "Open": 10.5, "High": 12, "Low": 10, "Close": 11.5, "Volume": 700, "RSI": 57},
    ]}))
    .unwrap();
    Rc::new(MarketDataIngestionService::new(TimeInterval::OneDay).ingest(payload))
}

fn with_rsi_and_volume() -> VisibilityConfig {
    let mut visibility = VisibilityConfig::default();
    visibility.set(IndicatorId::Rsi, true);
    visibility.set(IndicatorId::Volume, true);
    visibility
}

fn coordinator() -> (ChartCoordinator, Rc<RecordingFactory>, Rc<ManualFrameScheduler>) {
    let factory = Rc::new(RecordingFactory::default());
    let scheduler = Rc::new(ManualFrameScheduler::new());
    (ChartCoordinator::new(factory.clone(), scheduler.clone()), factory, scheduler)
}

#[wasm_bindgen_test]
fn rebuild_creates_one_pane_per_visible_group() {
    let (mut chart, factory, _) = coordinator();
    let built = chart.rebuild(snapshot(), &with_rsi_and_volume(), 1000.0, 800.0).unwrap();
    assert_eq!(built, 3);

    let roles: Vec<PaneRole> = chart.panes().iter().map(|p| p.role).collect();
    assert_eq!(roles.len(), 3);
    assert_eq!(roles[0], PaneRole::Primary);

    let primary = factory.pane(PaneId(0)).unwrap();
    let (width, height) = primary.sizes.borrow()[0];
    assert_eq!(width, 1000.0);
    assert!((height - 480.0).abs() < 1e-9);
    assert_eq!(primary.time_axis.get(), Some(false));
    assert_eq!(primary.fitted.get(), 1);

    let bottom = factory.pane(PaneId(2)).unwrap();
    assert!((bottom.sizes.borrow()[0].1 - 160.0).abs() < 1e-9);
    assert_eq!(bottom.time_axis.get(), Some(true));

    assert_eq!(chart.sync_engine().pane_count(), 3);
    assert_eq!(chart.sync_engine().subscription_count(), 6);
}

#[wasm_bindgen_test]
fn rebuild_disposes_previous_panes_first() {
    let (mut chart, factory, _) = coordinator();
    chart.rebuild(snapshot(), &with_rsi_and_volume(), 1000.0, 800.0).unwrap();
    let first_generation: Vec<_> = factory.panes.borrow().clone();

    chart.rebuild(snapshot(), &VisibilityConfig::default(), 1000.0, 800.0).unwrap();
    assert!(first_generation.iter().all(|p| p.removed.get() && p.subscriptions() == 0));
    assert_eq!(chart.panes().len(), 1);
    assert_eq!(factory.panes.borrow().len(), 4);
}

#[wasm_bindgen_test]
fn empty_snapshot_builds_nothing() {
    let (mut chart, factory, _) = coordinator();
    assert_eq!(chart.rebuild(Rc::new(MarketSnapshot::default()), &VisibilityConfig::default(), 800.0, 600.0), Ok(0));
    assert!(factory.panes.borrow().is_empty());
    assert!(chart.layout().is_none());
}

#[wasm_bindgen_test]
fn primary_failure_aborts_the_build() {
    let (mut chart, factory, _) = coordinator();
    factory.fail_on.set(Some(PaneId(0)));
    assert!(chart.rebuild(snapshot(), &with_rsi_and_volume(), 1000.0, 800.0).is_err());
    assert!(chart.panes().is_empty());
    assert_eq!(chart.sync_engine().pane_count(), 0);
}

#[wasm_bindgen_test]
fn failed_secondary_is_skipped() {
    let (mut chart, factory, scheduler) = coordinator();
    factory.fail_on.set(Some(PaneId(1)));
    assert_eq!(chart.rebuild(snapshot(), &with_rsi_and_volume(), 1000.0, 800.0), Ok(2));

    let ids: Vec<PaneId> = chart.panes().iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec![PaneId(0), PaneId(2)]);

    let range = LogicalRange::new(3.0, 30.0);
    factory.pane(PaneId(0)).unwrap().user_scroll(range);
    scheduler.run_frame();
    assert_eq!(factory.pane(PaneId(2)).unwrap().current_range(), Some(range));
}

#[wasm_bindgen_test]
fn resize_only_touches_panes_when_size_changes() {
    let (mut chart, factory, _) = coordinator();
    assert!(!chart.resize(1000.0, 800.0));
    chart.rebuild(snapshot(), &with_rsi_and_volume(), 1000.0, 800.0).unwrap();

    assert!(!chart.resize(1000.0, 800.0));
    assert!(chart.resize(1200.0, 900.0));

    let primary = factory.pane(PaneId(0)).unwrap();
    let (width, height) = *primary.sizes.borrow().last().unwrap();
    assert_eq!(width, 1200.0);
    assert!((height - 540.0).abs() < 1e-9);
    assert_eq!(factory.pane(PaneId(2)).unwrap().time_axis.get(), Some(true));
}

#[wasm_bindgen_test]
fn range_listener_follows_primary_scroll() {
    let (mut chart, factory, _) = coordinator();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    chart.set_range_listener(Rc::new(move || counter.set(counter.get() + 1)));
    chart.rebuild(snapshot(), &VisibilityConfig::default(), 800.0, 600.0).unwrap();

    let primary = factory.pane(PaneId(0)).unwrap();
    assert_eq!(primary.subscriptions_of(PaneEventKind::VisibleRangeChanged), 1);
    primary.user_scroll(LogicalRange::new(0.0, 40.0));
    assert_eq!(calls.get(), 1);

    chart.teardown();
    assert_eq!(primary.subscriptions(), 0);
}

#[wasm_bindgen_test]
fn hover_produces_legend_readout() {
    let (mut chart, factory, _) = coordinator();
    let readouts: Rc<RefCell<Vec<(PaneId, HoverReadout)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = readouts.clone();
    chart.set_hover_sink(Rc::new(move |pane, readout| sink.borrow_mut().push((pane, readout))));

    let data = snapshot();
    let hovered = data.candles[1].time;
    chart.rebuild(data, &with_rsi_and_volume(), 1000.0, 800.0).unwrap();

    factory.pane(PaneId(2)).unwrap().user_hover(hovered);
    let readouts = readouts.borrow();
    let (pane, readout) = readouts.first().expect("readout for the hovered pane");
    assert_eq!(*pane, PaneId(2));
    assert_eq!(readout.price, Some(11.5));
    assert_eq!(readout.value_of("RSI"), Some(57.0));
    assert_eq!(readout.value_of("Vol"), Some(700.0));
}

#[wasm_bindgen_test]
fn dropping_the_coordinator_removes_panes() {
    let (mut chart, factory, _) = coordinator();
    chart.rebuild(snapshot(), &with_rsi_and_volume(), 1000.0, 800.0).unwrap();
    drop(chart);
    assert!(factory.panes.borrow().iter().all(|p| p.removed.get()));
}
