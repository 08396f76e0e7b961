#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use price_panes_wasm::domain::chart::composition::SeriesBlueprint;
use price_panes_wasm::domain::chart::{
    ChartPane, CoordinateSpace, LogicalRange, PaneFactory, PaneId, PixelPoint, SeriesId, Viewport,
};
use price_panes_wasm::domain::drawing::{Drawing, DrawingPersistence};
use price_panes_wasm::domain::errors::{AppError, AppResult};
use price_panes_wasm::domain::events::{CrosshairMove, PaneEvent, PaneEventHandler, PaneEventKind, SubscriptionToken};
use price_panes_wasm::domain::market_data::{Symbol, TimeKey};

/// 1000x500 px over times 0..1000 and prices 0..100.
pub fn viewport() -> Viewport {
    Viewport { start_time: 0.0, end_time: 1000.0, min_price: 0.0, max_price: 100.0, width: 1000, height: 500 }
}

/// Crosshair call received by a pane: `Some(time)` for a placement, `None`
/// for a clear.
pub type CrosshairCall = Option<TimeKey>;

/// Pane double that records every call. Programmatic range and crosshair
/// changes are echoed back to subscribers, like the charting library does.
pub struct RecordingPane {
    id: PaneId,
    viewport: Viewport,
    range: Cell<Option<LogicalRange>>,
    handlers: RefCell<HashMap<SubscriptionToken, (PaneEventKind, PaneEventHandler)>>,
    next_token: Cell<u64>,
    next_series: Cell<u32>,
    pub applied_ranges: RefCell<Vec<LogicalRange>>,
    pub crosshairs: RefCell<Vec<CrosshairCall>>,
    pub series: RefCell<Vec<SeriesBlueprint>>,
    pub sizes: RefCell<Vec<(f64, f64)>>,
    pub time_axis: Cell<Option<bool>>,
    pub fitted: Cell<usize>,
    pub removed: Cell<bool>,
    pub fail_series: Cell<bool>,
}

impl RecordingPane {
    pub fn new(id: PaneId) -> Rc<Self> {
        Rc::new(Self::build(id, None))
    }

    pub fn with_range(id: PaneId, range: LogicalRange) -> Rc<Self> {
        Rc::new(Self::build(id, Some(range)))
    }

    fn build(id: PaneId, range: Option<LogicalRange>) -> Self {
        Self {
            id,
            viewport: viewport(),
            range: Cell::new(range),
            handlers: RefCell::new(HashMap::new()),
            next_token: Cell::new(1),
            next_series: Cell::new(0),
            applied_ranges: RefCell::new(Vec::new()),
            crosshairs: RefCell::new(Vec::new()),
            series: RefCell::new(Vec::new()),
            sizes: RefCell::new(Vec::new()),
            time_axis: Cell::new(None),
            fitted: Cell::new(0),
            removed: Cell::new(false),
            fail_series: Cell::new(false),
        }
    }

    pub fn current_range(&self) -> Option<LogicalRange> {
        self.range.get()
    }

    pub fn subscriptions(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn subscriptions_of(&self, kind: PaneEventKind) -> usize {
        self.handlers.borrow().values().filter(|(k, _)| *k == kind).count()
    }

    pub fn emit(&self, event: PaneEvent) {
        let kind = event.kind();
        let handlers: Vec<PaneEventHandler> =
            self.handlers.borrow().values().filter(|(k, _)| *k == kind).map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler(event.clone());
        }
    }

    /// The user scrolls or zooms this pane.
    pub fn user_scroll(&self, range: LogicalRange) {
        self.range.set(Some(range));
        self.emit(PaneEvent::VisibleRangeChanged(Some(range)));
    }

    /// The user hovers this pane at `time`.
    pub fn user_hover(&self, time: TimeKey) {
        self.emit(PaneEvent::CrosshairMoved(CrosshairMove::at(time, PixelPoint::new(10.0, 10.0))));
    }

    pub fn user_leave(&self) {
        self.emit(PaneEvent::CrosshairMoved(CrosshairMove::left()));
    }
}

impl CoordinateSpace for RecordingPane {
    fn time_to_coordinate(&self, time: TimeKey) -> Option<f64> {
        self.viewport.time_to_coordinate(time)
    }

    fn coordinate_to_time(&self, x: f64) -> Option<TimeKey> {
        self.viewport.coordinate_to_time(x)
    }

    fn price_to_coordinate(&self, series: SeriesId, price: f64) -> Option<f64> {
        self.viewport.price_to_coordinate(series, price)
    }

    fn coordinate_to_price(&self, series: SeriesId, y: f64) -> Option<f64> {
        self.viewport.coordinate_to_price(series, y)
    }
}

impl ChartPane for RecordingPane {
    fn id(&self) -> PaneId {
        self.id
    }

    fn coordinate_space(&self) -> &dyn CoordinateSpace {
        self
    }

    fn add_series(&self, blueprint: &SeriesBlueprint) -> AppResult<SeriesId> {
        if self.fail_series.get() {
            return Err(AppError::RenderingError("series rejected".to_string()));
        }
        self.series.borrow_mut().push(blueprint.clone());
        let id = self.next_series.get();
        self.next_series.set(id + 1);
        Ok(SeriesId(id))
    }

    fn resize(&self, width: f64, height: f64) {
        self.sizes.borrow_mut().push((width, height));
    }

    fn set_time_axis_visible(&self, visible: bool) {
        self.time_axis.set(Some(visible));
    }

    fn fit_content(&self) {
        self.fitted.set(self.fitted.get() + 1);
    }

    fn visible_logical_range(&self) -> Option<LogicalRange> {
        self.range.get()
    }

    fn set_visible_logical_range(&self, range: LogicalRange) {
        self.applied_ranges.borrow_mut().push(range);
        self.range.set(Some(range));
        self.emit(PaneEvent::VisibleRangeChanged(Some(range)));
    }

    fn set_crosshair_position(&self, time: TimeKey, _anchor: SeriesId) {
        self.crosshairs.borrow_mut().push(Some(time));
        self.emit(PaneEvent::CrosshairMoved(CrosshairMove::at(time, PixelPoint::new(0.0, 0.0))));
    }

    fn clear_crosshair_position(&self) {
        self.crosshairs.borrow_mut().push(None);
        self.emit(PaneEvent::CrosshairMoved(CrosshairMove::left()));
    }

    fn subscribe(&self, kind: PaneEventKind, handler: PaneEventHandler) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.handlers.borrow_mut().insert(token, (kind, handler));
        token
    }

    fn unsubscribe(&self, _kind: PaneEventKind, token: SubscriptionToken) {
        self.handlers.borrow_mut().remove(&token);
    }

    fn remove(&self) {
        self.handlers.borrow_mut().clear();
        self.removed.set(true);
    }
}

/// Builds `RecordingPane`s and keeps them for inspection.
#[derive(Default)]
pub struct RecordingFactory {
    pub panes: RefCell<Vec<Rc<RecordingPane>>>,
    pub fail_on: Cell<Option<PaneId>>,
}

impl RecordingFactory {
    pub fn pane(&self, id: PaneId) -> Option<Rc<RecordingPane>> {
        self.panes.borrow().iter().rev().find(|p| p.id() == id).cloned()
    }
}

impl PaneFactory for RecordingFactory {
    fn create_pane(&self, id: PaneId, width: f64, height: f64, show_time_axis: bool) -> AppResult<Rc<dyn ChartPane>> {
        if self.fail_on.get() == Some(id) {
            return Err(AppError::RenderingError(format!("cannot create {}", id)));
        }
        let pane = RecordingPane::with_range(id, LogicalRange::new(0.0, 100.0));
        pane.sizes.borrow_mut().push((width, height));
        pane.time_axis.set(Some(show_time_axis));
        self.panes.borrow_mut().push(pane.clone());
        Ok(pane)
    }
}

/// Persistence double counting full-list writes.
#[derive(Default)]
pub struct RecordingStore {
    pub writes: RefCell<Vec<(Symbol, Vec<Drawing>)>>,
}

impl RecordingStore {
    pub fn count(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn last(&self) -> Option<Vec<Drawing>> {
        self.writes.borrow().last().map(|(_, d)| d.clone())
    }
}

impl DrawingPersistence for RecordingStore {
    fn persist(&self, symbol: &Symbol, drawings: Vec<Drawing>) {
        self.writes.borrow_mut().push((symbol.clone(), drawings));
    }
}
