//! Leptos views over the application layer.

pub mod chart_view;
pub mod overlay_view;

pub use chart_view::ChartView;
pub use overlay_view::{DrawingOverlay, SharedCoordinator, SharedOverlay, with_primary_adapter};
