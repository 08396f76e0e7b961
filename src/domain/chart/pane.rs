use std::rc::Rc;

use super::composition::SeriesBlueprint;
use super::coordinates::CoordinateSpace;
use super::value_objects::{LogicalRange, PaneId, SeriesId};
use crate::domain::errors::AppResult;
use crate::domain::events::{PaneEventHandler, PaneEventKind, SubscriptionToken};
use crate::domain::market_data::TimeKey;

/// Capability surface of one chart pane. The browser implementation wraps a
/// charting-library instance; tests use recording doubles.
///
/// Methods take `&self`: the underlying handles are shared and mutate
/// internally, and panes are reachable from several owners at once.
pub trait ChartPane: CoordinateSpace {
    fn id(&self) -> PaneId;

    /// This pane's scales, for building a `CoordinateAdapter`.
    fn coordinate_space(&self) -> &dyn CoordinateSpace;

    /// Create a series, fill its data, price lines and markers.
    fn add_series(&self, blueprint: &SeriesBlueprint) -> AppResult<SeriesId>;

    fn resize(&self, width: f64, height: f64);
    fn set_time_axis_visible(&self, visible: bool);
    fn fit_content(&self);

    fn visible_logical_range(&self) -> Option<LogicalRange>;
    fn set_visible_logical_range(&self, range: LogicalRange);

    /// Place the crosshair at `time`, using `anchor`'s price scale.
    fn set_crosshair_position(&self, time: TimeKey, anchor: SeriesId);
    fn clear_crosshair_position(&self);

    fn subscribe(&self, kind: PaneEventKind, handler: PaneEventHandler) -> SubscriptionToken;
    fn unsubscribe(&self, kind: PaneEventKind, token: SubscriptionToken);

    /// Dispose the pane. No method is called on it afterwards.
    fn remove(&self);
}

/// Construction path for panes; every pane built here must be `remove`d.
pub trait PaneFactory {
    fn create_pane(&self, id: PaneId, width: f64, height: f64, show_time_axis: bool) -> AppResult<Rc<dyn ChartPane>>;
}

/// Pane registered with the sync engine, with the series that anchors the
/// crosshair on it. A pane with no anchor still follows the visible range.
#[derive(Clone)]
pub struct SyncTarget {
    pub pane: Rc<dyn ChartPane>,
    pub anchor: Option<SeriesId>,
}

impl SyncTarget {
    pub fn new(pane: Rc<dyn ChartPane>, anchor: Option<SeriesId>) -> Self {
        Self { pane, anchor }
    }

    pub fn id(&self) -> PaneId {
        self.pane.id()
    }
}
