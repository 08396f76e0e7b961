use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::domain::errors::AppError;
use crate::domain::market_data::TimeKey;

/// Identifier of a pane within one chart build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(fmt = "pane#{}", _0)]
pub struct PaneId(pub usize);

impl PaneId {
    pub const PRIMARY: PaneId = PaneId(0);

    pub fn is_primary(&self) -> bool {
        *self == Self::PRIMARY
    }
}

/// Handle of a series inside a pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(fmt = "series#{}", _0)]
pub struct SeriesId(pub u32);

/// Value Object - visible range in bar-index units, shared by all panes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

impl LogicalRange {
    pub fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    pub fn span(&self) -> f64 {
        self.to - self.from
    }

    pub fn is_valid(&self) -> bool {
        self.from.is_finite() && self.to.is_finite() && self.to >= self.from
    }
}

/// Value Object - pixel position inside a pane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance_to(&self, other: PixelPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Value Object - Viewport
///
/// Linear time/price window over a fixed pixel surface. Used as the headless
/// coordinate space for panes that are not backed by the charting library.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub start_time: f64,
    pub end_time: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: 0.0,
            min_price: 0.0,
            max_price: 100.0,
            width: 800,
            height: 600,
        }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, ..Default::default() }
    }

    pub fn time_range(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn price_range(&self) -> f64 {
        self.max_price - self.min_price
    }

    /// Convert a timestamp in seconds to a screen X coordinate
    pub fn time_to_x(&self, timestamp: f64) -> f64 {
        if self.time_range() == 0.0 {
            return 0.0;
        }
        let normalized = (timestamp - self.start_time) / self.time_range();
        normalized * self.width as f64
    }

    /// Convert a price to a screen Y coordinate
    pub fn price_to_y(&self, price: f64) -> f64 {
        if self.price_range() == 0.0 {
            return self.height as f64 / 2.0;
        }
        let normalized = (price - self.min_price) / self.price_range();
        self.height as f64 * (1.0 - normalized) // Invert Y
    }

    /// Convert a screen X coordinate back to time
    pub fn x_to_time(&self, x: f64) -> f64 {
        let normalized = x / self.width as f64;
        self.start_time + self.time_range() * normalized
    }

    /// Convert a screen Y coordinate back to price
    pub fn y_to_price(&self, y: f64) -> f64 {
        let normalized = 1.0 - (y / self.height as f64);
        self.min_price + self.price_range() * normalized
    }

    pub fn contains_x(&self, x: f64) -> bool {
        x >= 0.0 && x <= self.width as f64
    }

    pub fn contains_y(&self, y: f64) -> bool {
        y >= 0.0 && y <= self.height as f64
    }

    pub fn contains_time(&self, time: TimeKey) -> bool {
        let t = time.as_f64();
        t >= self.start_time && t <= self.end_time
    }
}

/// Value Object - Color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn from_hex(hex: u32) -> Self {
        Self::rgb(((hex >> 16) & 0xFF) as u8, ((hex >> 8) & 0xFF) as u8, (hex & 0xFF) as u8)
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let digits = text.trim().trim_start_matches('#');
        let invalid = || AppError::ValidationError(format!("Invalid color: {}", text));
        if !matches!(digits.len(), 6 | 8) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
        if digits.len() == 6 {
            Ok(Self::from_hex(value))
        } else {
            let alpha = (value & 0xFF) as f32 / 255.0;
            Ok(Self::from_hex(value >> 8).with_alpha(alpha))
        }
    }

    pub fn to_hex(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub fn with_alpha(&self, alpha: f32) -> Self {
        Self { a: alpha, ..*self }
    }

    /// CSS color string understood by both the charting library and SVG.
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:06x}", self.to_hex())
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BULL: Color = Color::rgb(0x26, 0xa6, 0x9a);
    pub const BEAR: Color = Color::rgb(0xef, 0x53, 0x50);
    pub const TREND_UP: Color = Color::rgb(0x00, 0xc8, 0x53);
    pub const TREND_DOWN: Color = Color::rgb(0xff, 0x52, 0x52);
    pub const ACCENT: Color = Color::rgb(0x29, 0x62, 0xff);
    pub const ORANGE: Color = Color::rgb(0xff, 0x98, 0x00);
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}
