use super::value_objects::TimeKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{AsRefStr, EnumIter, EnumString};

/// Domain entity - Candle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: TimeKey,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(time: TimeKey, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { time, open, high, low, close, volume }
    }

    /// Flat candles count as up bars.
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// One sample of an indicator series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: TimeKey,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(time: TimeKey, value: f64) -> Self {
        Self { time, value }
    }
}

/// Discrete trading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    None,
}

impl Signal {
    /// Upstream encoding: 1 buy, -1 sell, anything else none.
    pub fn from_value(value: f64) -> Self {
        if value == 1.0 {
            Signal::Buy
        } else if value == -1.0 {
            Signal::Sell
        } else {
            Signal::None
        }
    }

    /// SuperTrend direction: -1 is an up trend, 1 a down trend.
    pub fn from_trend_direction(value: f64) -> Self {
        if value == -1.0 {
            Signal::Buy
        } else if value == 1.0 {
            Signal::Sell
        } else {
            Signal::None
        }
    }

    pub fn is_some(&self) -> bool {
        !matches!(self, Signal::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalPoint {
    pub time: TimeKey,
    pub signal: Signal,
}

/// Pattern detected upstream by the AI classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiPattern {
    pub time: TimeKey,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: i64,
    pub confidence: Option<f64>,
}

impl AiPattern {
    pub fn is_bullish(&self) -> bool {
        self.kind == 1
    }
}

/// Indicator columns carried by each price row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, AsRefStr)]
pub enum IndicatorField {
    #[strum(serialize = "MA20")]
    Ma20,
    #[strum(serialize = "MA50")]
    Ma50,
    #[strum(serialize = "MA200")]
    Ma200,
    #[strum(serialize = "EMA9")]
    Ema9,
    #[strum(serialize = "EMA21")]
    Ema21,
    #[strum(serialize = "BB_UPPER")]
    BbUpper,
    #[strum(serialize = "BB_LOWER")]
    BbLower,
    #[strum(serialize = "BB_MIDDLE")]
    BbMiddle,
    #[strum(serialize = "NW_SMOOTH")]
    NwSmooth,
    #[strum(serialize = "NW_UPPER")]
    NwUpper,
    #[strum(serialize = "NW_LOWER")]
    NwLower,
    #[strum(serialize = "NW_DIR")]
    NwDir,
    #[strum(serialize = "NW_SIGNAL")]
    NwSignal,
    #[strum(serialize = "RSI")]
    Rsi,
    #[strum(serialize = "MACD")]
    Macd,
    #[strum(serialize = "MACD_SIGNAL")]
    MacdSignal,
    #[strum(serialize = "ST_UPPER")]
    StUpper,
    #[strum(serialize = "ST_LOWER")]
    StLower,
    #[strum(serialize = "ST_TREND")]
    StTrend,
    #[strum(serialize = "STOCH_K")]
    StochK,
    #[strum(serialize = "STOCH_D")]
    StochD,
    #[strum(serialize = "VWAP")]
    Vwap,
    #[strum(serialize = "ATR")]
    Atr,
    #[strum(serialize = "MFI")]
    Mfi,
    #[strum(serialize = "CCI")]
    Cci,
    #[strum(serialize = "BB_PCT")]
    BbPct,
    #[strum(serialize = "WILLIAMS_R")]
    WilliamsR,
    #[strum(serialize = "CMF")]
    Cmf,
    /// Sourced from the `Volume` column
    #[strum(serialize = "VOLUME")]
    Volume,
}

impl IndicatorField {
    /// Column name in the upstream price row.
    pub fn column(&self) -> &str {
        match self {
            IndicatorField::Volume => "Volume",
            other => other.as_ref(),
        }
    }
}

/// Named indicator series, each sorted by time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    series: HashMap<IndicatorField, Vec<SeriesPoint>>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: IndicatorField, mut points: Vec<SeriesPoint>) {
        points.sort_by(|a, b| a.time.cmp(&b.time));
        points.dedup_by(|later, earlier| later.time == earlier.time);
        self.series.insert(field, points);
    }

    pub fn push(&mut self, field: IndicatorField, point: SeriesPoint) {
        self.series.entry(field).or_default().push(point);
    }

    /// Restore the sorted, unique-time invariant after a run of `push` calls.
    pub fn normalize(&mut self) {
        for points in self.series.values_mut() {
            points.sort_by(|a, b| a.time.cmp(&b.time));
            points.dedup_by(|later, earlier| later.time == earlier.time);
        }
    }

    pub fn get(&self, field: IndicatorField) -> &[SeriesPoint] {
        self.series.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: IndicatorField) -> bool {
        !self.get(field).is_empty()
    }

    /// Exact-match lookup. A warm-up gap is `None`, never nearest-neighbour.
    pub fn value_at(&self, field: IndicatorField, time: TimeKey) -> Option<f64> {
        value_at(self.get(field), time)
    }

    /// Non-zero entries of a signal column.
    pub fn signals(&self, field: IndicatorField) -> Vec<SignalPoint> {
        self.get(field)
            .iter()
            .map(|p| SignalPoint { time: p.time, signal: Signal::from_value(p.value) })
            .filter(|p| p.signal.is_some())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(Vec::is_empty)
    }
}

/// Binary search over a time-sorted series.
pub fn value_at(points: &[SeriesPoint], time: TimeKey) -> Option<f64> {
    points
        .binary_search_by(|p| p.time.cmp(&time))
        .ok()
        .map(|idx| points[idx].value)
}

/// Everything the chart consumes for one instrument and interval
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    pub candles: Vec<Candle>,
    pub indicators: IndicatorSet,
    pub patterns: Vec<AiPattern>,
    pub fundamental: Option<serde_json::Value>,
    pub correlation: Option<serde_json::Value>,
}

impl MarketSnapshot {
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candle_at(&self, time: TimeKey) -> Option<&Candle> {
        self.candles
            .binary_search_by(|c| c.time.cmp(&time))
            .ok()
            .map(|idx| &self.candles[idx])
    }

    pub fn pattern_at(&self, time: TimeKey) -> Option<&AiPattern> {
        self.patterns.iter().find(|p| p.time == time)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }
}
