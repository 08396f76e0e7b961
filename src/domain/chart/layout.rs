use super::value_objects::PaneId;

/// Share of the container given to the primary pane with one secondary pane.
pub const PRIMARY_SHARE_SINGLE: f64 = 0.75;
/// Share of the container given to the primary pane with two or more secondary panes.
pub const PRIMARY_SHARE_MULTI: f64 = 0.60;

/// Pixel allocation for the primary pane and each active secondary pane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneLayout {
    pub width: f64,
    pub primary_height: f64,
    /// Height of every active secondary pane; zero when there are none.
    pub secondary_height: f64,
    pub secondary_count: usize,
}

impl PaneLayout {
    pub fn total_secondary_height(&self) -> f64 {
        self.secondary_height * self.secondary_count as f64
    }

    /// Height of a pane by position: the primary pane is index 0.
    pub fn height_of(&self, pane: PaneId) -> f64 {
        if pane.is_primary() { self.primary_height } else { self.secondary_height }
    }

    /// Only the bottom pane draws time-axis labels.
    pub fn shows_time_axis(&self, pane: PaneId) -> bool {
        pane.0 == self.secondary_count
    }
}

/// Split `container_height` between the primary pane and the visible
/// secondary panes.
pub fn compute_layout(container_height: f64, secondary_visibility: &[bool]) -> PaneLayout {
    compute_layout_with_width(0.0, container_height, secondary_visibility)
}

pub fn compute_layout_with_width(width: f64, container_height: f64, secondary_visibility: &[bool]) -> PaneLayout {
    let height = if container_height.is_finite() { container_height.max(0.0) } else { 0.0 };
    let secondary_count = secondary_visibility.iter().filter(|v| **v).count();
    let (primary_height, secondary_height) = match secondary_count {
        0 => (height, 0.0),
        1 => (height * PRIMARY_SHARE_SINGLE, height * (1.0 - PRIMARY_SHARE_SINGLE)),
        n => (height * PRIMARY_SHARE_MULTI, height * (1.0 - PRIMARY_SHARE_MULTI) / n as f64),
    };
    PaneLayout { width: width.max(0.0), primary_height, secondary_height, secondary_count }
}

/// Tracks the last applied layout so panes are only resized when the
/// container size or the visible set actually changed.
#[derive(Debug, Default)]
pub struct LayoutManager {
    current: Option<PaneLayout>,
}

impl LayoutManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<PaneLayout> {
        self.current
    }

    /// Returns the new layout when it differs from the applied one.
    pub fn update(&mut self, width: f64, container_height: f64, secondary_visibility: &[bool]) -> Option<PaneLayout> {
        let layout = compute_layout_with_width(width, container_height, secondary_visibility);
        if self.current == Some(layout) {
            return None;
        }
        self.current = Some(layout);
        Some(layout)
    }

    /// Forget the applied layout, e.g. after panes were rebuilt.
    pub fn invalidate(&mut self) {
        self.current = None;
    }
}
