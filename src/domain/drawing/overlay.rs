use std::rc::Rc;

use super::entities::{Drawing, DrawingId, DrawingKind, Endpoint};
use super::geometry::{HitTest, ShapeGeometry};
use crate::domain::chart::coordinates::{CoordinateAdapter, DomainPoint, OFF_SCREEN, is_on_screen};
use crate::domain::chart::value_objects::PixelPoint;
use crate::domain::errors::AppResult;
use crate::domain::events::DrawingEvent;
use crate::domain::logging::{LogComponent, get_time_provider};
use crate::domain::market_data::Symbol;
use crate::{log_debug, log_info, log_warn};

/// Pixel thresholds of the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayConfig {
    /// Pointer-to-endpoint distance that grabs a handle (strictly less than).
    pub handle_radius: f64,
    pub body_tolerance: f64,
    pub context_tolerance: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self { handle_radius: 12.0, body_tolerance: 10.0, context_tolerance: 15.0 }
    }
}

/// Interface for full-list drawing uploads, keyed by instrument.
///
/// Fire-and-forget: implementations log their own failures, the in-memory
/// list stays authoritative either way.
pub trait DrawingPersistence {
    fn persist(&self, symbol: &Symbol, drawings: Vec<Drawing>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

impl PointerButton {
    /// Maps `MouseEvent.button`.
    pub fn from_dom(button: i16) -> Self {
        match button {
            0 => PointerButton::Primary,
            2 => PointerButton::Secondary,
            _ => PointerButton::Other,
        }
    }
}

/// Gesture in progress
#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    ResizingEndpoint {
        id: DrawingId,
        endpoint: Endpoint,
        changed: bool,
    },
    /// Original pixel positions are captured at the drag start; every move
    /// is applied to them, never to the last intermediate position.
    MovingShape {
        id: DrawingId,
        start: PixelPoint,
        origin_p1: PixelPoint,
        origin_p2: PixelPoint,
        changed: bool,
    },
    CreatingShape {
        draft: Drawing,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextMenu {
    pub id: DrawingId,
    /// Client (viewport) coordinates where the menu opens.
    pub position: PixelPoint,
}

/// Identifies one drawings load; only the latest ticket may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ScenePrimitive {
    Line {
        from: PixelPoint,
        to: PixelPoint,
        width: f64,
        dash: Option<&'static str>,
        opacity: f64,
    },
    Rect {
        min: PixelPoint,
        max: PixelPoint,
        fill: String,
    },
    Handle {
        center: PixelPoint,
        endpoint: Endpoint,
    },
    Label {
        at: PixelPoint,
        text: String,
    },
}

/// Everything needed to draw one shape, in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeScene {
    pub id: DrawingId,
    pub kind: DrawingKind,
    pub color: String,
    pub opacity: f64,
    pub ghost: bool,
    pub primitives: Vec<ScenePrimitive>,
}

pub const HANDLE_RADIUS_PX: f64 = 5.0;
pub const GHOST_OPACITY: f64 = 0.5;
pub const LABEL_FONT_PX: f64 = 10.0;

/// Доменный сервис пользовательских построений поверх основной панели.
///
/// Owns the drawing list of the current instrument exclusively. Pointer
/// gestures mutate it in place; committed mutations are uploaded as a whole.
pub struct AnnotationOverlay {
    config: OverlayConfig,
    symbol: Option<Symbol>,
    drawings: Vec<Drawing>,
    drag: DragState,
    tool: DrawingKind,
    drawing_mode: bool,
    context_menu: Option<ContextMenu>,
    load_generation: u64,
    /// A drawings load for `symbol` is in flight; uploads wait for it.
    loading: bool,
    persistence: Rc<dyn DrawingPersistence>,
}

impl AnnotationOverlay {
    pub fn new(persistence: Rc<dyn DrawingPersistence>) -> Self {
        Self::with_config(OverlayConfig::default(), persistence)
    }

    pub fn with_config(config: OverlayConfig, persistence: Rc<dyn DrawingPersistence>) -> Self {
        Self {
            config,
            symbol: None,
            drawings: Vec::new(),
            drag: DragState::Idle,
            tool: DrawingKind::default(),
            drawing_mode: false,
            context_menu: None,
            load_generation: 0,
            loading: false,
            persistence,
        }
    }

    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    pub fn drawing(&self, id: DrawingId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id == id)
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn draft(&self) -> Option<&Drawing> {
        match &self.drag {
            DragState::CreatingShape { draft } => Some(draft),
            _ => None,
        }
    }

    pub fn context_menu(&self) -> Option<ContextMenu> {
        self.context_menu
    }

    pub fn tool(&self) -> DrawingKind {
        self.tool
    }

    pub fn is_drawing_mode(&self) -> bool {
        self.drawing_mode
    }

    /// Pick `kind`; picking the active tool again leaves drawing mode.
    pub fn toggle_tool(&mut self, kind: DrawingKind) {
        if self.drawing_mode && self.tool == kind {
            self.drawing_mode = false;
        } else {
            self.tool = kind;
            self.drawing_mode = true;
        }
    }

    pub fn set_drawing_mode(&mut self, enabled: bool) {
        self.drawing_mode = enabled;
    }

    /// The surface takes pointer input only while drawing or dragging.
    pub fn is_capturing(&self) -> bool {
        self.drawing_mode || self.drag != DragState::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Switch instrument: the current list is discarded immediately.
    ///
    /// Shapes committed before the load completes are kept in memory and
    /// merged into the loaded list; nothing is uploaded meanwhile, since a
    /// full-list write would replace the stored drawings.
    pub fn begin_load(&mut self, symbol: Symbol) -> LoadTicket {
        self.load_generation += 1;
        self.loading = true;
        self.drawings.clear();
        self.drag = DragState::Idle;
        self.context_menu = None;
        self.symbol = Some(symbol);
        LoadTicket(self.load_generation)
    }

    /// Install a loaded list. Returns `false` for a superseded ticket.
    ///
    /// Shapes drawn while the load was pending are appended after the stored
    /// ones and the merged list is uploaded once. A failed load degrades to
    /// whatever was drawn meanwhile, without uploading.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: AppResult<Vec<Drawing>>) -> bool {
        if !self.loading || ticket.0 != self.load_generation {
            log_debug!(LogComponent::Domain("AnnotationOverlay"), "Ignoring stale drawings load #{}", ticket.0);
            return false;
        }
        self.loading = false;
        match result {
            Ok(stored) => {
                log_info!(
                    LogComponent::Domain("AnnotationOverlay"),
                    "📐 Loaded {} drawings for {}",
                    stored.len(),
                    self.symbol.as_ref().map(Symbol::value).unwrap_or("-")
                );
                let local = std::mem::replace(&mut self.drawings, stored);
                let mut merged = 0;
                for drawing in local {
                    if self.drawings.iter().all(|d| d.id != drawing.id) {
                        self.drawings.push(drawing);
                        merged += 1;
                    }
                }
                if merged > 0 {
                    log_info!(
                        LogComponent::Domain("AnnotationOverlay"),
                        "📐 Merged {} drawings made during the load",
                        merged
                    );
                    self.persist();
                }
            }
            Err(e) => {
                log_warn!(LogComponent::Domain("AnnotationOverlay"), "⚠️ Drawings unavailable: {}", e);
            }
        }
        true
    }

    /// Handle > body > new shape. Returns whether the gesture was taken.
    pub fn pointer_down(&mut self, adapter: &CoordinateAdapter<'_>, at: PixelPoint, button: PointerButton) -> bool {
        self.context_menu = None;
        if button != PointerButton::Primary {
            return false;
        }

        if let Some((id, endpoint)) = self.handle_at(adapter, at) {
            self.drag = DragState::ResizingEndpoint { id, endpoint, changed: false };
            return true;
        }

        let body = self.drawings.iter().find(|d| ShapeGeometry::of(d, adapter).contains_point(at, &self.config));
        if let Some(drawing) = body {
            self.drag = DragState::MovingShape {
                id: drawing.id,
                start: at,
                origin_p1: adapter.domain_to_pixel(&drawing.p1),
                origin_p2: adapter.domain_to_pixel(&drawing.p2),
                changed: false,
            };
            return true;
        }

        if !self.drawing_mode {
            return false;
        }
        let Some(anchor) = adapter.pixel_to_domain(at.x, at.y).valid() else {
            return false;
        };
        self.drag = DragState::CreatingShape { draft: Drawing::started_at(self.next_id(), self.tool, anchor) };
        true
    }

    /// Returns whether anything visible changed.
    pub fn pointer_move(&mut self, adapter: &CoordinateAdapter<'_>, at: PixelPoint) -> bool {
        match &mut self.drag {
            DragState::Idle => false,
            DragState::CreatingShape { draft } => match adapter.pixel_to_domain(at.x, at.y).valid() {
                Some(point) => {
                    draft.p2 = point;
                    true
                }
                None => false,
            },
            DragState::ResizingEndpoint { id, endpoint, changed } => {
                let Some(point) = adapter.pixel_to_domain(at.x, at.y).valid() else {
                    return false;
                };
                let Some(drawing) = self.drawings.iter_mut().find(|d| d.id == *id) else {
                    return false;
                };
                let point = match drawing.kind {
                    DrawingKind::HorizontalLine => DomainPoint::new(drawing.p1.time, point.price),
                    _ => point,
                };
                drawing.set_point(*endpoint, point);
                *changed = true;
                true
            }
            DragState::MovingShape { id, start, origin_p1, origin_p2, changed } => {
                let (dx, dy) = (at.x - start.x, at.y - start.y);
                let Some(drawing) = self.drawings.iter_mut().find(|d| d.id == *id) else {
                    return false;
                };
                if drawing.kind == DrawingKind::HorizontalLine {
                    // Price only: the anchor time may be scrolled out of view.
                    let Some(price) = adapter.y_to_price(origin_p1.y + dy) else {
                        return false;
                    };
                    drawing.p1.price = price;
                } else {
                    let p1 = Self::shifted(adapter, *origin_p1, dx, dy);
                    let p2 = Self::shifted(adapter, *origin_p2, dx, dy);
                    let (Some(p1), Some(p2)) = (p1, p2) else {
                        return false;
                    };
                    drawing.p1 = p1;
                    drawing.p2 = p2;
                }
                *changed = true;
                true
            }
        }
    }

    /// Ends the gesture and commits it.
    pub fn pointer_up(&mut self) -> Option<DrawingEvent> {
        let event = match std::mem::replace(&mut self.drag, DragState::Idle) {
            DragState::Idle => return None,
            DragState::CreatingShape { draft } => {
                let id = draft.id;
                self.drawings.push(draft);
                DrawingEvent::Created { id: id.0 }
            }
            DragState::ResizingEndpoint { id, changed: true, .. } => DrawingEvent::Resized { id: id.0 },
            DragState::MovingShape { id, changed: true, .. } => DrawingEvent::Moved { id: id.0 },
            _ => return None,
        };
        self.persist();
        Some(event)
    }

    /// Secondary click. Opens the menu on the first shape under the pointer.
    pub fn open_context_menu(
        &mut self,
        adapter: &CoordinateAdapter<'_>,
        at: PixelPoint,
        client: PixelPoint,
    ) -> Option<ContextMenu> {
        let id = self.body_at(adapter, at, self.config.context_tolerance).map(|d| d.id)?;
        let menu = ContextMenu { id, position: client };
        self.context_menu = Some(menu);
        Some(menu)
    }

    pub fn cancel_context_menu(&mut self) {
        self.context_menu = None;
    }

    /// Remove one shape. Unknown ids change nothing and write nothing.
    pub fn delete(&mut self, id: DrawingId) -> Option<DrawingEvent> {
        self.context_menu = None;
        let before = self.drawings.len();
        self.drawings.retain(|d| d.id != id);
        if self.drawings.len() == before {
            return None;
        }
        if matches!(
            self.drag,
            DragState::ResizingEndpoint { id: dragged, .. } | DragState::MovingShape { id: dragged, .. } if dragged == id
        ) {
            self.drag = DragState::Idle;
        }
        self.persist();
        Some(DrawingEvent::Deleted { id: id.0 })
    }

    /// Empties the list for the current instrument. A pending load is
    /// abandoned so the stored shapes do not come back.
    pub fn clear_all(&mut self) -> DrawingEvent {
        let count = self.drawings.len();
        if self.loading {
            self.loading = false;
            self.load_generation += 1;
        }
        self.drawings.clear();
        self.drag = DragState::Idle;
        self.context_menu = None;
        self.persist();
        DrawingEvent::Cleared { count }
    }

    /// Pixel scene of every shape plus the shape being created, drawn last.
    pub fn render(&self, adapter: &CoordinateAdapter<'_>, width: f64) -> Vec<ShapeScene> {
        let mut scenes: Vec<ShapeScene> = self.drawings.iter().map(|d| Self::scene(adapter, d, width, false)).collect();
        if let Some(draft) = self.draft() {
            scenes.push(Self::scene(adapter, draft, width, true));
        }
        scenes
    }

    fn scene(adapter: &CoordinateAdapter<'_>, drawing: &Drawing, width: f64, ghost: bool) -> ShapeScene {
        let c1 = adapter.domain_to_pixel(&drawing.p1);
        let c2 = adapter.domain_to_pixel(&drawing.p2);
        let color = drawing.stroke();
        let mut primitives = match drawing.kind {
            DrawingKind::TrendLine => vec![Self::line(c1, c2, 3.0)],
            DrawingKind::HorizontalLine => {
                vec![Self::line(PixelPoint::new(0.0, c1.y), PixelPoint::new(width, c1.y), 3.0)]
            }
            DrawingKind::Box => vec![ScenePrimitive::Rect {
                min: PixelPoint::new(c1.x.min(c2.x), c1.y.min(c2.y)),
                max: PixelPoint::new(c1.x.max(c2.x), c1.y.max(c2.y)),
                fill: format!("{}22", color.with_alpha(1.0).to_css()),
            }],
            DrawingKind::Fibonacci if !(is_on_screen(c1) && is_on_screen(c2)) => Vec::new(),
            DrawingKind::Fibonacci => {
                let (min_x, max_x) = (c1.x.min(c2.x), c1.x.max(c2.x));
                let mut fib = vec![ScenePrimitive::Line { from: c1, to: c2, width: 1.0, dash: Some("3,3"), opacity: 1.0 }];
                for level in drawing.fibonacci_levels() {
                    let y = adapter.price_to_y(level.price).unwrap_or(OFF_SCREEN);
                    fib.push(ScenePrimitive::Line {
                        from: PixelPoint::new(min_x, y),
                        to: PixelPoint::new(max_x, y),
                        width: 1.0,
                        dash: None,
                        opacity: 0.6,
                    });
                    fib.push(ScenePrimitive::Label { at: PixelPoint::new(min_x + 5.0, y - 4.0), text: level.label() });
                }
                fib
            }
        };
        if !ghost {
            for endpoint in drawing.kind.handles() {
                let center = match endpoint {
                    Endpoint::P1 => c1,
                    Endpoint::P2 => c2,
                };
                if is_on_screen(center) {
                    primitives.push(ScenePrimitive::Handle { center, endpoint: *endpoint });
                }
            }
        }
        ShapeScene {
            id: drawing.id,
            kind: drawing.kind,
            color: color.to_css(),
            opacity: if ghost { GHOST_OPACITY } else { 1.0 },
            ghost,
            primitives,
        }
    }

    fn line(from: PixelPoint, to: PixelPoint, width: f64) -> ScenePrimitive {
        ScenePrimitive::Line { from, to, width, dash: None, opacity: 1.0 }
    }

    fn shifted(adapter: &CoordinateAdapter<'_>, origin: PixelPoint, dx: f64, dy: f64) -> Option<DomainPoint> {
        let moved = origin.offset(dx, dy);
        adapter.pixel_to_domain(moved.x, moved.y).valid()
    }

    fn handle_at(&self, adapter: &CoordinateAdapter<'_>, at: PixelPoint) -> Option<(DrawingId, Endpoint)> {
        self.drawings.iter().find_map(|drawing| {
            drawing
                .kind
                .handles()
                .iter()
                .find(|endpoint| adapter.domain_to_pixel(&drawing.point(**endpoint)).distance_to(at) < self.config.handle_radius)
                .map(|endpoint| (drawing.id, *endpoint))
        })
    }

    fn body_at(&self, adapter: &CoordinateAdapter<'_>, at: PixelPoint, tolerance: f64) -> Option<&Drawing> {
        self.drawings.iter().find(|drawing| ShapeGeometry::of(drawing, adapter).hit_within(at, tolerance))
    }

    fn next_id(&self) -> DrawingId {
        let mut id = get_time_provider().current_timestamp();
        while self.drawings.iter().any(|d| d.id.0 == id) {
            id += 1;
        }
        DrawingId(id)
    }

    fn persist(&self) {
        if self.loading {
            log_debug!(LogComponent::Domain("AnnotationOverlay"), "Upload deferred until drawings are loaded");
            return;
        }
        match &self.symbol {
            Some(symbol) => self.persistence.persist(symbol, self.drawings.clone()),
            None => {
                log_warn!(LogComponent::Domain("AnnotationOverlay"), "No instrument selected, drawings kept in memory");
            }
        }
    }
}

impl std::fmt::Debug for AnnotationOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationOverlay")
            .field("symbol", &self.symbol)
            .field("drawings", &self.drawings.len())
            .field("drag", &self.drag)
            .field("tool", &self.tool)
            .field("drawing_mode", &self.drawing_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::value_objects::{SeriesId, Viewport};
    use crate::domain::market_data::TimeKey;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Writes(RefCell<Vec<Vec<Drawing>>>);

    impl DrawingPersistence for Writes {
        fn persist(&self, _symbol: &Symbol, drawings: Vec<Drawing>) {
            self.0.borrow_mut().push(drawings);
        }
    }

    fn viewport() -> Viewport {
        Viewport { start_time: 0.0, end_time: 1000.0, min_price: 0.0, max_price: 100.0, width: 1000, height: 500 }
    }

    #[test]
    fn right_button_never_starts_a_gesture() {
        let writes = Rc::new(Writes::default());
        let mut overlay = AnnotationOverlay::new(writes);
        overlay.toggle_tool(DrawingKind::TrendLine);
        let vp = viewport();
        let adapter = CoordinateAdapter::new(&vp, SeriesId(0));
        assert!(!overlay.pointer_down(&adapter, PixelPoint::new(100.0, 100.0), PointerButton::Secondary));
        assert_eq!(overlay.drag_state(), &DragState::Idle);
    }

    #[test]
    fn hline_resize_keeps_anchor_time() {
        let writes = Rc::new(Writes::default());
        let mut overlay = AnnotationOverlay::new(writes.clone());
        let ticket = overlay.begin_load(Symbol::from("THYAO"));
        let p = DomainPoint::new(TimeKey::Unix(100), 50.0);
        let mut line = Drawing::started_at(DrawingId(1), DrawingKind::HorizontalLine, p);
        line.p2 = DomainPoint::new(TimeKey::Unix(300), 50.0);
        overlay.finish_load(ticket, Ok(vec![line]));

        let vp = viewport();
        let adapter = CoordinateAdapter::new(&vp, SeriesId(0));
        assert!(overlay.pointer_down(&adapter, PixelPoint::new(102.0, 250.0), PointerButton::Primary));
        assert!(overlay.pointer_move(&adapter, PixelPoint::new(400.0, 200.0)));
        assert_eq!(overlay.pointer_up(), Some(DrawingEvent::Resized { id: 1 }));

        let moved = &overlay.drawings()[0];
        assert_eq!(moved.p1.time, TimeKey::Unix(100));
        assert!((moved.p1.price - 60.0).abs() < 1e-9);
        assert_eq!(writes.0.borrow().len(), 1);
    }
}
