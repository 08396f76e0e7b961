mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::RecordingPane;
use price_panes_wasm::domain::chart::{
    ChartPane, LogicalRange, ManualFrameScheduler, PaneId, PaneSyncEngine, SeriesId, SyncTarget,
};
use price_panes_wasm::domain::events::PaneEventKind;
use price_panes_wasm::domain::market_data::TimeKey;
use wasm_bindgen_test::*;

struct Rig {
    scheduler: Rc<ManualFrameScheduler>,
    engine: PaneSyncEngine,
    panes: Vec<Rc<RecordingPane>>,
}

fn rig(count: usize) -> Rig {
    let scheduler = Rc::new(ManualFrameScheduler::new());
    let engine = PaneSyncEngine::new(scheduler.clone());
    let panes: Vec<Rc<RecordingPane>> = (0..count).map(|i| RecordingPane::new(PaneId(i))).collect();
    let targets = panes
        .iter()
        .map(|p| SyncTarget::new(p.clone() as Rc<dyn ChartPane>, Some(SeriesId(0))))
        .collect();
    engine.attach(targets);
    Rig { scheduler, engine, panes }
}

#[wasm_bindgen_test]
fn scroll_reaches_other_panes_once_without_echo() {
    let rig = rig(3);
    let range = LogicalRange::new(10.0, 60.0);

    rig.panes[0].user_scroll(range);
    assert!(rig.engine.is_range_pending());
    assert!(rig.panes[1].applied_ranges.borrow().is_empty());

    assert_eq!(rig.scheduler.run_frame(), 1);
    assert_eq!(*rig.panes[1].applied_ranges.borrow(), vec![range]);
    assert_eq!(*rig.panes[2].applied_ranges.borrow(), vec![range]);
    assert!(rig.panes[0].applied_ranges.borrow().is_empty());
    assert_eq!(rig.scheduler.pending(), 0);
    assert!(!rig.engine.is_range_pending());
}

#[wasm_bindgen_test]
fn changes_within_a_frame_are_coalesced() {
    let rig = rig(2);
    rig.panes[0].user_scroll(LogicalRange::new(0.0, 10.0));
    rig.panes[0].user_scroll(LogicalRange::new(5.0, 15.0));
    rig.panes[0].user_scroll(LogicalRange::new(7.0, 17.0));

    assert_eq!(rig.scheduler.pending(), 1);
    rig.scheduler.run_frame();
    assert_eq!(*rig.panes[1].applied_ranges.borrow(), vec![LogicalRange::new(7.0, 17.0)]);
}

#[wasm_bindgen_test]
fn late_echo_of_applied_range_is_ignored() {
    let rig = rig(2);
    let range = LogicalRange::new(20.0, 40.0);
    rig.panes[1].user_scroll(range);
    rig.scheduler.run_frame();
    assert_eq!(*rig.panes[0].applied_ranges.borrow(), vec![range]);

    // The library reports the same range again after the guard was released.
    rig.panes[0].user_scroll(range);
    assert_eq!(rig.scheduler.pending(), 0);
    assert!(rig.panes[1].applied_ranges.borrow().is_empty());
}

#[wasm_bindgen_test]
fn invalid_ranges_are_not_propagated() {
    let rig = rig(2);
    rig.panes[0].user_scroll(LogicalRange::new(50.0, 10.0));
    rig.panes[0].user_scroll(LogicalRange::new(f64::NAN, 10.0));
    assert_eq!(rig.scheduler.pending(), 0);
}

#[wasm_bindgen_test]
fn crosshair_follows_the_hovered_pane() {
    let rig = rig(3);
    let time = TimeKey::Unix(1_700_000_000);

    rig.panes[1].user_hover(time);
    assert_eq!(*rig.panes[0].crosshairs.borrow(), vec![Some(time)]);
    assert_eq!(*rig.panes[2].crosshairs.borrow(), vec![Some(time)]);
    assert!(rig.panes[1].crosshairs.borrow().is_empty());

    rig.panes[1].user_leave();
    assert_eq!(*rig.panes[0].crosshairs.borrow(), vec![Some(time), None]);
    assert_eq!(*rig.panes[2].crosshairs.borrow(), vec![Some(time), None]);
}

#[wasm_bindgen_test]
fn panes_without_anchor_series_are_skipped_on_placement() {
    let scheduler = Rc::new(ManualFrameScheduler::new());
    let engine = PaneSyncEngine::new(scheduler);
    let primary = RecordingPane::new(PaneId(0));
    let empty = RecordingPane::new(PaneId(1));
    engine.attach(vec![
        SyncTarget::new(primary.clone(), Some(SeriesId(0))),
        SyncTarget::new(empty.clone(), None),
    ]);

    primary.user_hover(TimeKey::Unix(5));
    assert!(empty.crosshairs.borrow().is_empty());
    primary.user_leave();
    assert_eq!(*empty.crosshairs.borrow(), vec![None]);
}

#[wasm_bindgen_test]
fn attach_pushes_primary_range_to_secondaries() {
    let scheduler = Rc::new(ManualFrameScheduler::new());
    let engine = PaneSyncEngine::new(scheduler.clone());
    let initial = LogicalRange::new(100.0, 250.0);
    let primary = RecordingPane::with_range(PaneId(0), initial);
    let secondary = RecordingPane::new(PaneId(1));
    engine.attach(vec![SyncTarget::new(primary.clone(), Some(SeriesId(0))), SyncTarget::new(secondary.clone(), None)]);

    assert_eq!(*secondary.applied_ranges.borrow(), vec![initial]);
    assert!(primary.applied_ranges.borrow().is_empty());
    assert_eq!(scheduler.pending(), 0);
}

#[wasm_bindgen_test]
fn single_pane_only_listens_to_crosshair() {
    let rig = rig(1);
    assert_eq!(rig.engine.subscription_count(), 1);
    assert_eq!(rig.panes[0].subscriptions_of(PaneEventKind::VisibleRangeChanged), 0);
    assert_eq!(rig.panes[0].subscriptions_of(PaneEventKind::CrosshairMoved), 1);

    rig.panes[0].user_scroll(LogicalRange::new(0.0, 5.0));
    assert_eq!(rig.scheduler.pending(), 0);
}

#[wasm_bindgen_test]
fn detach_releases_every_subscription() {
    let rig = rig(3);
    assert_eq!(rig.engine.subscription_count(), 6);
    rig.engine.detach();
    rig.engine.detach();

    assert_eq!(rig.engine.pane_count(), 0);
    assert!(rig.panes.iter().all(|p| p.subscriptions() == 0));

    rig.panes[0].user_scroll(LogicalRange::new(1.0, 2.0));
    assert_eq!(rig.scheduler.pending(), 0);
}

#[wasm_bindgen_test]
fn pending_frame_after_detach_is_harmless() {
    let rig = rig(2);
    rig.panes[0].user_scroll(LogicalRange::new(1.0, 9.0));
    rig.engine.detach();
    rig.scheduler.run_frame();
    assert!(rig.panes[1].applied_ranges.borrow().is_empty());
}

#[wasm_bindgen_test]
fn dropping_the_engine_unsubscribes() {
    let rig = rig(2);
    let panes = rig.panes.clone();
    drop(rig);
    assert!(panes.iter().all(|p| p.subscriptions() == 0));
}

#[wasm_bindgen_test]
fn observer_sees_every_crosshair_move() {
    let rig = rig(2);
    let seen: Rc<RefCell<Vec<(PaneId, Option<TimeKey>)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    rig.engine.set_crosshair_observer(Rc::new(move |pane, movement| {
        sink.borrow_mut().push((pane, movement.time));
    }));

    rig.panes[0].user_hover(TimeKey::Unix(42));
    rig.panes[0].user_leave();

    let seen = seen.borrow();
    assert_eq!(seen.first(), Some(&(PaneId(0), Some(TimeKey::Unix(42)))));
    assert_eq!(seen.last().map(|(_, t)| *t), Some(None));
    assert!(seen.iter().filter(|(p, _)| *p == PaneId(0)).count() == 2);
}
