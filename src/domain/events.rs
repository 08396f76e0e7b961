use crate::domain::chart::value_objects::{LogicalRange, PixelPoint};
use crate::domain::market_data::TimeKey;
use std::fmt::Debug;
use std::rc::Rc;

/// Base trait for all domain events
pub trait DomainEvent: Debug + Clone {
    fn event_type(&self) -> &'static str;
    fn timestamp(&self) -> u64 {
        use crate::domain::logging::get_time_provider;
        get_time_provider().current_timestamp()
    }
}

/// Notification kinds a pane can publish. Together with the pane id this keys
/// the sync engine's subscription table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneEventKind {
    VisibleRangeChanged,
    CrosshairMoved,
}

/// Pointer focus reported by a pane. `point` is `None` once the pointer leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct CrosshairMove {
    pub time: Option<TimeKey>,
    pub point: Option<PixelPoint>,
}

impl CrosshairMove {
    pub fn at(time: TimeKey, point: PixelPoint) -> Self {
        Self { time: Some(time), point: Some(point) }
    }

    pub fn left() -> Self {
        Self { time: None, point: None }
    }
}

/// Events emitted by a single chart pane
#[derive(Debug, Clone, PartialEq)]
pub enum PaneEvent {
    VisibleRangeChanged(Option<LogicalRange>),
    CrosshairMoved(CrosshairMove),
}

impl PaneEvent {
    pub fn kind(&self) -> PaneEventKind {
        match self {
            PaneEvent::VisibleRangeChanged(_) => PaneEventKind::VisibleRangeChanged,
            PaneEvent::CrosshairMoved(_) => PaneEventKind::CrosshairMoved,
        }
    }
}

impl DomainEvent for PaneEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PaneEvent::VisibleRangeChanged(_) => "VisibleRangeChanged",
            PaneEvent::CrosshairMoved(_) => "CrosshairMoved",
        }
    }
}

/// Handler registered on a pane. Shared so one closure can be handed to the
/// charting library and kept alive by the subscriber.
pub type PaneEventHandler = Rc<dyn Fn(PaneEvent)>;

/// Opaque handle returned by a pane subscription, needed to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(pub u64);

/// Lifecycle of the user's annotations
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingEvent {
    Created { id: u64 },
    Moved { id: u64 },
    Resized { id: u64 },
    Deleted { id: u64 },
    Cleared { count: usize },
}

impl DomainEvent for DrawingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DrawingEvent::Created { .. } => "DrawingCreated",
            DrawingEvent::Moved { .. } => "DrawingMoved",
            DrawingEvent::Resized { .. } => "DrawingResized",
            DrawingEvent::Deleted { .. } => "DrawingDeleted",
            DrawingEvent::Cleared { .. } => "DrawingsCleared",
        }
    }
}
