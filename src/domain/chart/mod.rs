//! Chart aggregate: pane scales, layout, composition and cross-pane sync.

pub mod composition;
pub mod coordinates;
pub mod layout;
pub mod legend;
pub mod pane;
pub mod sync;
pub mod trend_segments;
pub mod value_objects;
pub mod visibility;

pub use coordinates::{CoordinateAdapter, CoordinateSpace, DomainPoint, OFF_SCREEN, ProjectedPoint};
pub use layout::{LayoutManager, PaneLayout, compute_layout};
pub use pane::{ChartPane, PaneFactory, SyncTarget};
pub use sync::{FrameScheduler, ManualFrameScheduler, PaneSyncEngine};
pub use trend_segments::{TrendClass, TrendSegment, TrendSegmenter};
pub use value_objects::*;
pub use visibility::{ChartSettings, IndicatorId, SecondaryPane, SettingsStore, VisibilityConfig};
