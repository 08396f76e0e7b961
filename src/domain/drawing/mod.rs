//! User annotations over the primary pane.

pub mod entities;
pub mod geometry;
pub mod overlay;

pub use entities::{Drawing, DrawingId, DrawingKind, Endpoint, FIB_RATIOS, FibLevel, fibonacci_levels};
pub use geometry::{HitTest, ShapeGeometry};
pub use overlay::{
    AnnotationOverlay, ContextMenu, DragState, DrawingPersistence, LoadTicket, OverlayConfig, PointerButton,
    ScenePrimitive, ShapeScene,
};
