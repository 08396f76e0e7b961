use std::collections::HashMap;

use super::value_objects::Color;
use crate::domain::market_data::{SeriesPoint, Signal, SignalPoint, TimeKey, value_at};

/// Color class of a trend run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrendClass {
    #[default]
    Rising,
    Falling,
}

impl TrendClass {
    pub fn from_signal(signal: Signal) -> Option<Self> {
        match signal {
            Signal::Buy => Some(TrendClass::Rising),
            Signal::Sell => Some(TrendClass::Falling),
            Signal::None => None,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            TrendClass::Rising => Color::TREND_UP,
            TrendClass::Falling => Color::TREND_DOWN,
        }
    }
}

/// Maximal run of an indicator drawn in one color class
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSegment {
    pub class: TrendClass,
    pub points: Vec<SeriesPoint>,
}

impl TrendSegment {
    pub fn first_time(&self) -> Option<TimeKey> {
        self.points.first().map(|p| p.time)
    }

    pub fn last_time(&self) -> Option<TimeKey> {
        self.points.last().map(|p| p.time)
    }
}

/// One bar as seen by the segmenter: the value each class would draw and the
/// signal observed at that bar.
#[derive(Debug, Clone, Copy)]
struct Bar {
    time: TimeKey,
    rising: f64,
    falling: f64,
    signal: Signal,
}

impl Bar {
    fn point(&self, class: TrendClass) -> SeriesPoint {
        match class {
            TrendClass::Rising => SeriesPoint::new(self.time, self.rising),
            TrendClass::Falling => SeriesPoint::new(self.time, self.falling),
        }
    }
}

/// Splits a continuous series into alternating color runs.
///
/// A signal at bar `i` switches the class from bar `i` onward. Bar `i` is
/// appended to the run that was in force up to it and, on a switch, also opens
/// the next run, so consecutive runs share exactly one boundary point.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendSegmenter {
    default_class: TrendClass,
}

impl TrendSegmenter {
    pub fn new(default_class: TrendClass) -> Self {
        Self { default_class }
    }

    pub fn default_class(&self) -> TrendClass {
        self.default_class
    }

    /// Two-tone rendering of a single line driven by sparse signals.
    pub fn segment(&self, source: &[SeriesPoint], signals: &[SignalPoint]) -> Vec<TrendSegment> {
        let by_time: HashMap<TimeKey, Signal> = signals
            .iter()
            .filter(|s| s.signal.is_some())
            .map(|s| (s.time, s.signal))
            .collect();
        let bars: Vec<Bar> = source
            .iter()
            .map(|p| Bar {
                time: p.time,
                rising: p.value,
                falling: p.value,
                signal: by_time.get(&p.time).copied().unwrap_or(Signal::None),
            })
            .collect();
        self.run(&bars)
    }

    /// Stop-and-reverse line: the lower band is drawn while rising, the upper
    /// band while falling. `trend` carries the per-bar direction.
    pub fn segment_bands(
        &self,
        upper: &[SeriesPoint],
        lower: &[SeriesPoint],
        trend: &[SignalPoint],
    ) -> Vec<TrendSegment> {
        let bars: Vec<Bar> = trend
            .iter()
            .filter_map(|t| {
                Some(Bar {
                    time: t.time,
                    rising: value_at(lower, t.time)?,
                    falling: value_at(upper, t.time)?,
                    signal: t.signal,
                })
            })
            .collect();
        self.run(&bars)
    }

    fn run(&self, bars: &[Bar]) -> Vec<TrendSegment> {
        let mut segments = Vec::new();
        let Some(first) = bars.first() else {
            return segments;
        };

        let mut current = self.default_class;
        let mut open = TrendSegment { class: current, points: vec![first.point(current)] };

        for (idx, bar) in bars.iter().enumerate() {
            if idx > 0 {
                open.points.push(bar.point(current));
            }
            let next = TrendClass::from_signal(bar.signal).unwrap_or(current);
            if next != current {
                let finished = std::mem::replace(
                    &mut open,
                    TrendSegment { class: next, points: vec![bar.point(next)] },
                );
                segments.push(finished);
                current = next;
            }
        }

        segments.push(open);
        segments
    }
}

/// Segments of one class in time order.
pub fn segments_of(segments: &[TrendSegment], class: TrendClass) -> impl Iterator<Item = &TrendSegment> {
    segments.iter().filter(move |s| s.class == class)
}
