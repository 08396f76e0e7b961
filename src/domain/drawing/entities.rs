use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

use crate::domain::chart::coordinates::DomainPoint;
use crate::domain::chart::value_objects::Color;

/// Ratios of the Fibonacci retracement guide lines.
pub const FIB_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

/// Shape type, tagged on the wire as `type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, AsRefStr, Serialize, Deserialize)]
pub enum DrawingKind {
    #[default]
    #[serde(rename = "trend")]
    #[strum(serialize = "trend")]
    TrendLine,
    #[serde(rename = "hline")]
    #[strum(serialize = "hline")]
    HorizontalLine,
    #[serde(rename = "box")]
    #[strum(serialize = "box")]
    Box,
    #[serde(rename = "fib")]
    #[strum(serialize = "fib")]
    Fibonacci,
}

impl DrawingKind {
    pub fn default_color(&self) -> Color {
        match self {
            DrawingKind::Fibonacci => Color::ORANGE,
            _ => Color::ACCENT,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrawingKind::TrendLine => "Trend",
            DrawingKind::HorizontalLine => "Horizontal",
            DrawingKind::Box => "Box",
            DrawingKind::Fibonacci => "Fibonacci",
        }
    }

    /// Endpoints the user can grab. A horizontal line only exposes `p1`.
    pub fn handles(&self) -> &'static [Endpoint] {
        match self {
            DrawingKind::HorizontalLine => &[Endpoint::P1],
            _ => &[Endpoint::P1, Endpoint::P2],
        }
    }

    pub fn all() -> Vec<DrawingKind> {
        DrawingKind::iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    P1,
    P2,
}

/// Opaque drawing id. Creation timestamps in milliseconds; stored lists may
/// carry it as a number or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DrawingId(pub u64);

impl std::fmt::Display for DrawingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for DrawingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Integer(u64),
            Float(f64),
            Text(String),
        }
        match RawId::deserialize(deserializer)? {
            RawId::Integer(id) => Ok(DrawingId(id)),
            RawId::Float(id) if id.is_finite() && id >= 0.0 => Ok(DrawingId(id as u64)),
            RawId::Float(_) => Err(serde::de::Error::custom("invalid drawing id")),
            RawId::Text(text) => text
                .trim()
                .parse::<u64>()
                .map(DrawingId)
                .map_err(|e| serde::de::Error::custom(format!("invalid drawing id {}: {}", text, e))),
        }
    }
}

fn default_color() -> String {
    Color::ACCENT.to_css()
}

/// Entity - user annotation in domain space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub id: DrawingId,
    #[serde(rename = "type")]
    pub kind: DrawingKind,
    pub p1: DomainPoint,
    pub p2: DomainPoint,
    #[serde(default = "default_color")]
    pub color: String,
}

impl Drawing {
    /// Provisional shape with both endpoints at `anchor`.
    pub fn started_at(id: DrawingId, kind: DrawingKind, anchor: DomainPoint) -> Self {
        Self { id, kind, p1: anchor, p2: anchor, color: kind.default_color().to_css() }
    }

    pub fn point(&self, endpoint: Endpoint) -> DomainPoint {
        match endpoint {
            Endpoint::P1 => self.p1,
            Endpoint::P2 => self.p2,
        }
    }

    pub fn set_point(&mut self, endpoint: Endpoint, point: DomainPoint) {
        match endpoint {
            Endpoint::P1 => self.p1 = point,
            Endpoint::P2 => self.p2 = point,
        }
    }

    /// Stroke color, falling back to the kind default for unreadable values.
    pub fn stroke(&self) -> Color {
        Color::parse(&self.color).unwrap_or_else(|_| self.kind.default_color())
    }

    pub fn fibonacci_levels(&self) -> Vec<FibLevel> {
        fibonacci_levels(self.p1.price, self.p2.price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

impl FibLevel {
    pub fn label(&self) -> String {
        format!("{} ({:.2})", self.ratio, self.price)
    }
}

/// Retracement from `anchor` (ratio 0) toward `reference` (ratio 1).
pub fn fibonacci_levels(anchor: f64, reference: f64) -> Vec<FibLevel> {
    let diff = anchor - reference;
    FIB_RATIOS.iter().map(|&ratio| FibLevel { ratio, price: anchor - diff * ratio }).collect()
}
