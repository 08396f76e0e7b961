use serde::Serialize;

use crate::domain::logging::LogComponent;
use crate::log_debug;

use super::trend_segments::{TrendClass, TrendSegment, TrendSegmenter, segments_of};
use super::value_objects::{Color, PaneId};
use super::visibility::{IndicatorId, SecondaryPane, VisibilityConfig};
use crate::domain::market_data::{
    Candle, IndicatorField, MarketSnapshot, SeriesPoint, Signal, SignalPoint, TimeKey, value_at,
};

const VOLUME_UP: Color = Color::new(38, 166, 154, 0.5);
const VOLUME_DOWN: Color = Color::new(239, 83, 80, 0.5);

/// Series drawing primitive provided by the charting library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Candlestick,
    Line,
    Histogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

impl Serialize for LineStyle {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(match self {
            LineStyle::Solid => 0,
            LineStyle::Dashed => 2,
        })
    }
}

/// Series options, serialized in the charting library's option shape
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_style: Option<LineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_value_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_line_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_scale_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wick_up_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wick_down_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_visible: Option<bool>,
}

impl SeriesStyle {
    pub fn line(color: Color, width: f64, title: &str) -> Self {
        Self { color: Some(color), line_width: Some(width), title: Some(title.to_string()), ..Default::default() }
    }

    pub fn dashed(mut self) -> Self {
        self.line_style = Some(LineStyle::Dashed);
        self
    }

    pub fn untitled(mut self) -> Self {
        self.title = None;
        self
    }

    /// No last-value label and no price line, for decorative two-tone runs.
    pub fn quiet(mut self) -> Self {
        self.last_value_visible = Some(false);
        self.price_line_visible = Some(false);
        self
    }
}

/// Line sample; `value: None` is a gap the library leaves undrawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinePoint {
    pub time: TimeKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramPoint {
    pub time: TimeKey,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    Candles(Vec<Candle>),
    Line(Vec<LinePoint>),
    Histogram(Vec<HistogramPoint>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Candles(c) => c.len(),
            SeriesData::Line(l) => l.len(),
            SeriesData::Histogram(h) => h.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Horizontal reference line attached to a series
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceLine {
    pub price: f64,
    pub color: Color,
    pub line_width: f64,
    pub line_style: LineStyle,
    pub axis_label_visible: bool,
    pub title: String,
}

impl PriceLine {
    pub fn dashed(price: f64, color: Color) -> Self {
        Self {
            price,
            color,
            line_width: 1.0,
            line_style: LineStyle::Dashed,
            axis_label_visible: true,
            title: format_level(price),
        }
    }
}

fn format_level(price: f64) -> String {
    if price.fract() == 0.0 { format!("{}", price as i64) } else { format!("{}", price) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerPosition {
    AboveBar,
    BelowBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerShape {
    ArrowUp,
    ArrowDown,
}

/// Annotation pinned to a bar of the candle series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub time: TimeKey,
    pub position: MarkerPosition,
    pub color: Color,
    pub shape: MarkerShape,
    pub text: String,
    pub size: f64,
    pub id: &'static str,
}

/// Everything needed to create and fill one series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesBlueprint {
    pub kind: SeriesKind,
    pub style: SeriesStyle,
    pub data: SeriesData,
    pub price_lines: Vec<PriceLine>,
    pub markers: Vec<Marker>,
}

impl SeriesBlueprint {
    fn new(kind: SeriesKind, style: SeriesStyle, data: SeriesData) -> Self {
        Self { kind, style, data, price_lines: Vec::new(), markers: Vec::new() }
    }

    fn line(style: SeriesStyle, points: &[SeriesPoint]) -> Self {
        Self::new(SeriesKind::Line, style, SeriesData::Line(to_line(points)))
    }

    fn with_price_lines(mut self, lines: Vec<PriceLine>) -> Self {
        self.price_lines = lines;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneRole {
    Primary,
    Secondary(SecondaryPane),
}

/// One pane to build: its position, role and series. `anchor` indexes the
/// series used to place the synchronized crosshair.
#[derive(Debug, Clone, PartialEq)]
pub struct PaneBlueprint {
    pub id: PaneId,
    pub role: PaneRole,
    pub series: Vec<SeriesBlueprint>,
    pub anchor: usize,
}

impl PaneBlueprint {
    pub fn title(&self) -> &'static str {
        match self.role {
            PaneRole::Primary => "PRICE",
            PaneRole::Secondary(pane) => pane.title(),
        }
    }
}

fn to_line(points: &[SeriesPoint]) -> Vec<LinePoint> {
    points.iter().map(|p| LinePoint { time: p.time, value: Some(p.value) }).collect()
}

/// Joins same-class runs into lines, with a gap wherever the other class owns
/// at least one interior bar.
///
/// An opposite run of a single bar leaves no bar to hold a gap, so the next
/// run continues on another line instead of bridging over it. The first line
/// always exists, even when the class never occurs.
pub fn class_lines(segments: &[TrendSegment], class: TrendClass) -> Vec<Vec<LinePoint>> {
    let mut times: Vec<TimeKey> = segments.iter().flat_map(|s| s.points.iter().map(|p| p.time)).collect();
    times.sort_unstable();
    times.dedup();
    let first_between = |after: TimeKey, before: TimeKey| {
        times.get(times.partition_point(|t| *t <= after)).copied().filter(|t| *t < before)
    };

    let mut lines: Vec<Vec<LinePoint>> = vec![Vec::new()];
    let mut current = 0;
    for segment in segments.iter().filter(|s| s.class == class) {
        let Some(start) = segment.first_time() else {
            continue;
        };
        if let Some(last) = lines[current].last().map(|p| p.time).filter(|last| *last < start) {
            match first_between(last, start) {
                Some(gap) => lines[current].push(LinePoint { time: gap, value: None }),
                None => {
                    current = 1 - current;
                    if lines.len() <= current {
                        lines.push(Vec::new());
                    }
                    let resume = lines[current].last().and_then(|p| first_between(p.time, start));
                    if let Some(gap) = resume {
                        lines[current].push(LinePoint { time: gap, value: None });
                    }
                }
            }
        }
        let line = &mut lines[current];
        for point in &segment.points {
            if line.last().is_some_and(|last| last.time >= point.time) {
                continue;
            }
            line.push(LinePoint { time: point.time, value: Some(point.value) });
        }
    }

    lines
}

/// Builds pane blueprints for the visible elements of a snapshot.
pub struct PaneComposer {
    segmenter: TrendSegmenter,
}

impl Default for PaneComposer {
    fn default() -> Self {
        Self::new(TrendSegmenter::default())
    }
}

impl PaneComposer {
    pub fn new(segmenter: TrendSegmenter) -> Self {
        Self { segmenter }
    }

    pub fn compose(&self, snapshot: &MarketSnapshot, visibility: &VisibilityConfig) -> Vec<PaneBlueprint> {
        let mut panes = vec![self.primary_pane(snapshot, visibility)];
        for (idx, pane) in visibility.active_secondary_panes().into_iter().enumerate() {
            let (series, anchor) = self.secondary_series(pane, snapshot);
            panes.push(PaneBlueprint { id: PaneId(idx + 1), role: PaneRole::Secondary(pane), series, anchor });
        }
        panes
    }

    fn primary_pane(&self, snapshot: &MarketSnapshot, visibility: &VisibilityConfig) -> PaneBlueprint {
        let ind = &snapshot.indicators;
        let mut candles = SeriesBlueprint::new(
            SeriesKind::Candlestick,
            SeriesStyle {
                up_color: Some(Color::BULL),
                down_color: Some(Color::BEAR),
                wick_up_color: Some(Color::BULL),
                wick_down_color: Some(Color::BEAR),
                border_visible: Some(false),
                ..Default::default()
            },
            SeriesData::Candles(snapshot.candles.clone()),
        );
        candles.markers = self.markers(snapshot, visibility);
        let mut series = vec![candles];

        let overlays = [
            (IndicatorId::Ma20, IndicatorField::Ma20, Color::ACCENT, "MA20"),
            (IndicatorId::Ma50, IndicatorField::Ma50, Color::ORANGE, "MA50"),
            (IndicatorId::Ma200, IndicatorField::Ma200, Color::rgb(0xf4, 0x43, 0x36), "MA200"),
            (IndicatorId::Ema9, IndicatorField::Ema9, Color::rgb(0x4c, 0xaf, 0x50), "EMA9"),
            (IndicatorId::Ema21, IndicatorField::Ema21, Color::rgb(0xe9, 0x1e, 0x63), "EMA21"),
        ];
        for (id, field, color, title) in overlays {
            if visibility.is_visible(id) && ind.has(field) {
                series.push(SeriesBlueprint::line(SeriesStyle::line(color, 1.5, title), ind.get(field)));
            }
        }

        if visibility.is_visible(IndicatorId::Nw) && ind.has(IndicatorField::NwSmooth) {
            let segments = self
                .segmenter
                .segment(ind.get(IndicatorField::NwSmooth), &ind.signals(IndicatorField::NwSignal));
            let (up, down) = segment_counts(&segments);
            log_debug!(LogComponent::Domain("PaneComposer"), "NW trend: {} rising / {} falling runs", up, down);
            series.extend(two_tone(&segments, "LuxAlgo NW Up", "LuxAlgo NW Down"));

            if visibility.is_visible(IndicatorId::NwEnv) && ind.has(IndicatorField::NwUpper) {
                let envelope = Color::new(0, 188, 212, 0.25);
                for field in [IndicatorField::NwUpper, IndicatorField::NwLower] {
                    let style = SeriesStyle::line(envelope, 1.0, "").untitled().dashed();
                    series.push(SeriesBlueprint::line(style, ind.get(field)));
                }
            }
        }

        if visibility.is_visible(IndicatorId::Bb) && ind.has(IndicatorField::BbUpper) {
            let band = Color::new(33, 150, 243, 0.5);
            series.push(SeriesBlueprint::line(SeriesStyle::line(band, 1.0, "BB Upper"), ind.get(IndicatorField::BbUpper)));
            series.push(SeriesBlueprint::line(SeriesStyle::line(band, 1.0, "BB Lower"), ind.get(IndicatorField::BbLower)));
            let middle = SeriesStyle::line(Color::new(255, 255, 255, 0.2), 1.0, "BB Middle").dashed();
            series.push(SeriesBlueprint::line(middle, ind.get(IndicatorField::BbMiddle)));
        }

        if visibility.is_visible(IndicatorId::BbPct) && ind.has(IndicatorField::BbPct) {
            let mut style = SeriesStyle::line(Color::rgb(0x21, 0x96, 0xf3), 1.0, "%B");
            style.price_scale_id = Some("left".to_string());
            series.push(SeriesBlueprint::line(style, ind.get(IndicatorField::BbPct)));
        }

        if visibility.is_visible(IndicatorId::Supertrend) && ind.has(IndicatorField::StUpper) {
            let trend: Vec<SignalPoint> = ind
                .get(IndicatorField::StTrend)
                .iter()
                .map(|p| SignalPoint { time: p.time, signal: Signal::from_trend_direction(p.value) })
                .collect();
            let segments = self.segmenter.segment_bands(
                ind.get(IndicatorField::StUpper),
                ind.get(IndicatorField::StLower),
                &trend,
            );
            series.extend(two_tone(&segments, "ST Up", "ST Down"));
        }

        if visibility.is_visible(IndicatorId::Vwap) && ind.has(IndicatorField::Vwap) {
            let style = SeriesStyle::line(Color::rgb(0xff, 0xeb, 0x3b), 1.5, "VWAP");
            series.push(SeriesBlueprint::line(style, ind.get(IndicatorField::Vwap)));
        }

        PaneBlueprint { id: PaneId::PRIMARY, role: PaneRole::Primary, series, anchor: 0 }
    }

    /// Signal arrows and AI pattern labels, in time order.
    fn markers(&self, snapshot: &MarketSnapshot, visibility: &VisibilityConfig) -> Vec<Marker> {
        let mut markers = Vec::new();
        if visibility.is_visible(IndicatorId::Nw) {
            for signal in snapshot.indicators.signals(IndicatorField::NwSignal) {
                let buy = signal.signal == Signal::Buy;
                markers.push(Marker {
                    time: signal.time,
                    position: if buy { MarkerPosition::BelowBar } else { MarkerPosition::AboveBar },
                    color: if buy { Color::TREND_UP } else { Color::TREND_DOWN },
                    shape: if buy { MarkerShape::ArrowUp } else { MarkerShape::ArrowDown },
                    text: if buy { "B" } else { "S" }.to_string(),
                    size: 1.0,
                    id: "nw",
                });
            }
        }
        if visibility.is_visible(IndicatorId::AiPatterns) {
            for pattern in &snapshot.patterns {
                let bullish = pattern.is_bullish();
                markers.push(Marker {
                    time: pattern.time,
                    position: if bullish { MarkerPosition::BelowBar } else { MarkerPosition::AboveBar },
                    color: if bullish { Color::BULL } else { Color::BEAR },
                    shape: if bullish { MarkerShape::ArrowUp } else { MarkerShape::ArrowDown },
                    text: pattern.label.clone(),
                    size: 1.5,
                    id: "ai",
                });
            }
        }
        markers.sort_by(|a, b| a.time.cmp(&b.time));
        markers
    }

    fn secondary_series(&self, pane: SecondaryPane, snapshot: &MarketSnapshot) -> (Vec<SeriesBlueprint>, usize) {
        let ind = &snapshot.indicators;
        let line = |color: u32, width: f64, title: &str, field: IndicatorField| {
            SeriesBlueprint::line(SeriesStyle::line(Color::from_hex(color), width, title), ind.get(field))
        };
        let bands = |upper: f64, lower: f64| vec![PriceLine::dashed(upper, Color::BEAR), PriceLine::dashed(lower, Color::BULL)];

        match pane {
            SecondaryPane::Volume => {
                let data = ind
                    .get(IndicatorField::Volume)
                    .iter()
                    .map(|v| HistogramPoint {
                        time: v.time,
                        value: v.value,
                        color: Some(match snapshot.candle_at(v.time) {
                            Some(candle) if !candle.is_bullish() => VOLUME_DOWN,
                            _ => VOLUME_UP,
                        }),
                    })
                    .collect();
                let style = SeriesStyle { color: Some(Color::BULL), title: Some("Volume".to_string()), ..Default::default() };
                (vec![SeriesBlueprint::new(SeriesKind::Histogram, style, SeriesData::Histogram(data))], 0)
            }
            SecondaryPane::Rsi => (vec![line(0x7e57c2, 2.0, "RSI", IndicatorField::Rsi).with_price_lines(bands(70.0, 30.0))], 0),
            SecondaryPane::Macd => {
                let macd = ind.get(IndicatorField::Macd);
                let signal = ind.get(IndicatorField::MacdSignal);
                let histogram = macd
                    .iter()
                    .filter_map(|m| {
                        let value = m.value - value_at(signal, m.time)?;
                        Some(HistogramPoint {
                            time: m.time,
                            value,
                            color: Some(if value >= 0.0 { VOLUME_UP } else { VOLUME_DOWN }),
                        })
                    })
                    .collect();
                let hist_style = SeriesStyle { title: Some("Histogram".to_string()), ..Default::default() };
                (
                    vec![
                        SeriesBlueprint::new(SeriesKind::Histogram, hist_style, SeriesData::Histogram(histogram)),
                        line(0x2962ff, 1.0, "MACD", IndicatorField::Macd),
                        line(0xff5252, 1.0, "Signal", IndicatorField::MacdSignal),
                    ],
                    1,
                )
            }
            SecondaryPane::Stoch => (
                vec![
                    line(0x2962ff, 1.5, "%K", IndicatorField::StochK),
                    line(0xff9800, 1.5, "%D", IndicatorField::StochD),
                ],
                0,
            ),
            SecondaryPane::Atr => (vec![line(0x9c27b0, 1.5, "ATR", IndicatorField::Atr)], 0),
            SecondaryPane::Mfi => (vec![line(0x4caf50, 1.5, "MFI", IndicatorField::Mfi).with_price_lines(bands(80.0, 20.0))], 0),
            SecondaryPane::Cci => (vec![line(0xffa726, 1.5, "CCI", IndicatorField::Cci).with_price_lines(bands(100.0, -100.0))], 0),
            SecondaryPane::WilliamsR => (
                vec![line(0xf06292, 1.5, "W %R", IndicatorField::WilliamsR).with_price_lines(bands(-20.0, -80.0))],
                0,
            ),
            SecondaryPane::Cmf => {
                let data = ind
                    .get(IndicatorField::Cmf)
                    .iter()
                    .map(|v| HistogramPoint {
                        time: v.time,
                        value: v.value,
                        color: Some(if v.value >= 0.0 { VOLUME_UP } else { VOLUME_DOWN }),
                    })
                    .collect();
                let style = SeriesStyle { title: Some("CMF".to_string()), ..Default::default() };
                (vec![SeriesBlueprint::new(SeriesKind::Histogram, style, SeriesData::Histogram(data))], 0)
            }
        }
    }
}

fn two_tone(segments: &[TrendSegment], up_title: &str, down_title: &str) -> Vec<SeriesBlueprint> {
    let mut series = Vec::new();
    for (class, title) in [(TrendClass::Rising, up_title), (TrendClass::Falling, down_title)] {
        for (idx, line) in class_lines(segments, class).into_iter().enumerate() {
            let style = SeriesStyle::line(class.color(), 2.0, title).quiet();
            let style = if idx == 0 { style } else { style.untitled() };
            series.push(SeriesBlueprint::new(SeriesKind::Line, style, SeriesData::Line(line)));
        }
    }
    series
}

/// Number of segments per class, for logging.
pub fn segment_counts(segments: &[TrendSegment]) -> (usize, usize) {
    (
        segments_of(segments, TrendClass::Rising).count(),
        segments_of(segments, TrendClass::Falling).count(),
    )
}
