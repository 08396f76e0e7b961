use super::entities::{Drawing, DrawingKind};
use super::overlay::OverlayConfig;
use crate::domain::chart::coordinates::{CoordinateAdapter, is_on_screen};
use crate::domain::chart::value_objects::PixelPoint;

/// Pixel-space hit testing, one implementation per shape variant.
pub trait HitTest {
    /// Shortest pixel distance from `point` to the drawn shape.
    fn distance_to(&self, point: PixelPoint) -> f64;

    fn hit_within(&self, point: PixelPoint, tolerance: f64) -> bool {
        self.distance_to(point) < tolerance
    }

    /// Body hit with the overlay's configured tolerance.
    fn contains_point(&self, point: PixelPoint, config: &OverlayConfig) -> bool {
        self.hit_within(point, config.body_tolerance)
    }
}

/// Distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: PixelPoint, a: PixelPoint, b: PixelPoint) -> f64 {
    let length_sq = (a.x - b.x).powi(2) + (a.y - b.y).powi(2);
    if length_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / length_sq).clamp(0.0, 1.0);
    p.distance_to(PixelPoint::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentShape {
    pub a: PixelPoint,
    pub b: PixelPoint,
}

impl HitTest for SegmentShape {
    fn distance_to(&self, point: PixelPoint) -> f64 {
        distance_to_segment(point, self.a, self.b)
    }
}

/// Full-width line at a fixed height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalLineShape {
    pub y: f64,
}

impl HitTest for HorizontalLineShape {
    fn distance_to(&self, point: PixelPoint) -> f64 {
        (point.y - self.y).abs()
    }
}

/// Axis-aligned rectangle spanning two corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape {
    pub min: PixelPoint,
    pub max: PixelPoint,
}

impl BoxShape {
    pub fn spanning(a: PixelPoint, b: PixelPoint) -> Self {
        Self {
            min: PixelPoint::new(a.x.min(b.x), a.y.min(b.y)),
            max: PixelPoint::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, point: PixelPoint) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

impl HitTest for BoxShape {
    fn distance_to(&self, point: PixelPoint) -> f64 {
        let dx = (self.min.x - point.x).max(0.0).max(point.x - self.max.x);
        let dy = (self.min.y - point.y).max(0.0).max(point.y - self.max.y);
        dx.hypot(dy)
    }

    /// Boxes are hit anywhere inside their area, tolerance does not widen them.
    fn hit_within(&self, point: PixelPoint, _tolerance: f64) -> bool {
        self.contains(point)
    }
}

/// Diagonal from anchor to reference plus one guide per retracement level
#[derive(Debug, Clone, PartialEq)]
pub struct FibonacciShape {
    pub diagonal: SegmentShape,
    pub min_x: f64,
    pub max_x: f64,
    pub level_ys: Vec<f64>,
}

impl HitTest for FibonacciShape {
    fn distance_to(&self, point: PixelPoint) -> f64 {
        self.level_ys
            .iter()
            .map(|&y| distance_to_segment(point, PixelPoint::new(self.min_x, y), PixelPoint::new(self.max_x, y)))
            .fold(self.diagonal.distance_to(point), f64::min)
    }
}

/// Pixel geometry of a drawing for the current scales
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    Segment(SegmentShape),
    HorizontalLine(HorizontalLineShape),
    Box(BoxShape),
    Fibonacci(FibonacciShape),
    /// A shape whose span the scales cannot place; never hit.
    Unplaced,
}

impl ShapeGeometry {
    pub fn of(drawing: &Drawing, adapter: &CoordinateAdapter<'_>) -> Self {
        let a = adapter.domain_to_pixel(&drawing.p1);
        let b = adapter.domain_to_pixel(&drawing.p2);
        match drawing.kind {
            DrawingKind::TrendLine => ShapeGeometry::Segment(SegmentShape { a, b }),
            DrawingKind::HorizontalLine => ShapeGeometry::HorizontalLine(HorizontalLineShape { y: a.y }),
            DrawingKind::Box => ShapeGeometry::Box(BoxShape::spanning(a, b)),
            DrawingKind::Fibonacci if !(is_on_screen(a) && is_on_screen(b)) => ShapeGeometry::Unplaced,
            DrawingKind::Fibonacci => ShapeGeometry::Fibonacci(FibonacciShape {
                diagonal: SegmentShape { a, b },
                min_x: a.x.min(b.x),
                max_x: a.x.max(b.x),
                level_ys: drawing
                    .fibonacci_levels()
                    .iter()
                    .filter_map(|level| adapter.price_to_y(level.price))
                    .collect(),
            }),
        }
    }

    fn as_hit_test(&self) -> Option<&dyn HitTest> {
        match self {
            ShapeGeometry::Segment(shape) => Some(shape),
            ShapeGeometry::HorizontalLine(shape) => Some(shape),
            ShapeGeometry::Box(shape) => Some(shape),
            ShapeGeometry::Fibonacci(shape) => Some(shape),
            ShapeGeometry::Unplaced => None,
        }
    }
}

impl HitTest for ShapeGeometry {
    fn distance_to(&self, point: PixelPoint) -> f64 {
        self.as_hit_test().map_or(f64::INFINITY, |shape| shape.distance_to(point))
    }

    fn hit_within(&self, point: PixelPoint, tolerance: f64) -> bool {
        self.as_hit_test().is_some_and(|shape| shape.hit_within(point, tolerance))
    }
}
