use serde::{Deserialize, Serialize};

use super::value_objects::{PixelPoint, SeriesId, Viewport};
use crate::domain::market_data::TimeKey;

/// Pixel value used for a domain point the scale cannot place.
pub const OFF_SCREEN: f64 = -1000.0;

/// Time and price scales of one pane, as exposed by the charting library.
///
/// Every conversion may fail: `None` means the value lies outside what the
/// scale can map (scrolled away, above the pane header, no series data).
pub trait CoordinateSpace {
    fn time_to_coordinate(&self, time: TimeKey) -> Option<f64>;
    fn coordinate_to_time(&self, x: f64) -> Option<TimeKey>;
    fn price_to_coordinate(&self, series: SeriesId, price: f64) -> Option<f64>;
    fn coordinate_to_price(&self, series: SeriesId, y: f64) -> Option<f64>;
}

/// Whether both axes of a projected pixel were placed by the scales.
pub fn is_on_screen(pixel: PixelPoint) -> bool {
    pixel.x != OFF_SCREEN && pixel.y != OFF_SCREEN
}

/// A (time, price) position in domain space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainPoint {
    pub time: TimeKey,
    pub price: f64,
}

impl DomainPoint {
    pub fn new(time: TimeKey, price: f64) -> Self {
        Self { time, price }
    }
}

/// Result of a pixel -> domain conversion, each axis resolved on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub time: Option<TimeKey>,
    pub price: Option<f64>,
}

impl ProjectedPoint {
    /// Both axes resolved and the price is a real number. Zero is a valid price.
    pub fn valid(&self) -> Option<DomainPoint> {
        match (self.time, self.price) {
            (Some(time), Some(price)) if price.is_finite() => Some(DomainPoint::new(time, price)),
            _ => None,
        }
    }
}

/// Binds a pane's scales to the series whose price scale anchors a drawing.
#[derive(Clone, Copy)]
pub struct CoordinateAdapter<'a> {
    space: &'a dyn CoordinateSpace,
    series: SeriesId,
}

impl<'a> CoordinateAdapter<'a> {
    pub fn new(space: &'a dyn CoordinateSpace, series: SeriesId) -> Self {
        Self { space, series }
    }

    pub fn series(&self) -> SeriesId {
        self.series
    }

    /// Never fails: axes the scale cannot place come back as `OFF_SCREEN`.
    pub fn domain_to_pixel(&self, point: &DomainPoint) -> PixelPoint {
        let x = self.space.time_to_coordinate(point.time).filter(|x| x.is_finite());
        PixelPoint::new(x.unwrap_or(OFF_SCREEN), self.price_to_y(point.price).unwrap_or(OFF_SCREEN))
    }

    pub fn pixel_to_domain(&self, x: f64, y: f64) -> ProjectedPoint {
        ProjectedPoint {
            time: self.space.coordinate_to_time(x),
            price: self.y_to_price(y),
        }
    }

    pub fn y_to_price(&self, y: f64) -> Option<f64> {
        self.space.coordinate_to_price(self.series, y).filter(|p| p.is_finite())
    }

    pub fn price_to_y(&self, price: f64) -> Option<f64> {
        if !price.is_finite() {
            return None;
        }
        self.space.price_to_coordinate(self.series, price).filter(|y| y.is_finite())
    }
}

impl CoordinateSpace for Viewport {
    fn time_to_coordinate(&self, time: TimeKey) -> Option<f64> {
        self.contains_time(time).then(|| self.time_to_x(time.as_f64()))
    }

    fn coordinate_to_time(&self, x: f64) -> Option<TimeKey> {
        if !x.is_finite() || !self.contains_x(x) {
            return None;
        }
        Some(TimeKey::Unix(self.x_to_time(x).round() as i64))
    }

    fn price_to_coordinate(&self, _series: SeriesId, price: f64) -> Option<f64> {
        Some(self.price_to_y(price))
    }

    fn coordinate_to_price(&self, _series: SeriesId, y: f64) -> Option<f64> {
        (y.is_finite() && self.contains_y(y)).then(|| self.y_to_price(y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            start_time: 0.0,
            end_time: 1000.0,
            min_price: 0.0,
            max_price: 100.0,
            width: 1000,
            height: 500,
        }
    }

    #[test]
    fn out_of_range_time_maps_to_sentinel() {
        let vp = viewport();
        let adapter = CoordinateAdapter::new(&vp, SeriesId(0));
        let pixel = adapter.domain_to_pixel(&DomainPoint::new(TimeKey::Unix(5000), 50.0));
        assert_eq!(pixel.x, OFF_SCREEN);
        assert_eq!(pixel.y, 250.0);
    }

    #[test]
    fn zero_price_is_a_valid_projection() {
        let vp = viewport();
        let adapter = CoordinateAdapter::new(&vp, SeriesId(0));
        let projected = adapter.pixel_to_domain(100.0, 500.0);
        assert_eq!(projected.valid(), Some(DomainPoint::new(TimeKey::Unix(100), 0.0)));
    }
}
