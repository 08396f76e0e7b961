use std::rc::Rc;

use super::visibility::{IndicatorId, VisibilityConfig};
use crate::domain::market_data::{IndicatorField, MarketSnapshot, TimeKey};

/// Indicator values shown in the on-chart legend, in display order.
const LEGEND_FIELDS: [(IndicatorId, IndicatorField, &str); 20] = [
    (IndicatorId::Ma20, IndicatorField::Ma20, "MA20"),
    (IndicatorId::Ma50, IndicatorField::Ma50, "MA50"),
    (IndicatorId::Ma200, IndicatorField::Ma200, "MA200"),
    (IndicatorId::Ema9, IndicatorField::Ema9, "EMA9"),
    (IndicatorId::Ema21, IndicatorField::Ema21, "EMA21"),
    (IndicatorId::Bb, IndicatorField::BbUpper, "BB Upper"),
    (IndicatorId::Bb, IndicatorField::BbLower, "BB Lower"),
    (IndicatorId::Nw, IndicatorField::NwSmooth, "NW"),
    (IndicatorId::Vwap, IndicatorField::Vwap, "VWAP"),
    (IndicatorId::Volume, IndicatorField::Volume, "Vol"),
    (IndicatorId::Rsi, IndicatorField::Rsi, "RSI"),
    (IndicatorId::Macd, IndicatorField::Macd, "MACD"),
    (IndicatorId::Macd, IndicatorField::MacdSignal, "Signal"),
    (IndicatorId::Stoch, IndicatorField::StochK, "%K"),
    (IndicatorId::Stoch, IndicatorField::StochD, "%D"),
    (IndicatorId::Atr, IndicatorField::Atr, "ATR"),
    (IndicatorId::Mfi, IndicatorField::Mfi, "MFI"),
    (IndicatorId::Cci, IndicatorField::Cci, "CCI"),
    (IndicatorId::WilliamsR, IndicatorField::WilliamsR, "W%R"),
    (IndicatorId::Cmf, IndicatorField::Cmf, "CMF"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct LegendValue {
    pub indicator: IndicatorId,
    pub label: &'static str,
    /// `None` when the series has no point at the hovered bar.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternReadout {
    pub label: String,
    pub confidence: Option<f64>,
}

/// Legend contents for the hovered bar
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HoverReadout {
    pub time: Option<TimeKey>,
    pub price: Option<f64>,
    pub values: Vec<LegendValue>,
    pub pattern: Option<PatternReadout>,
}

impl HoverReadout {
    pub fn value_of(&self, field_label: &str) -> Option<f64> {
        self.values.iter().find(|v| v.label == field_label).and_then(|v| v.value)
    }
}

/// Resolves exact-time legend values against one snapshot
#[derive(Clone)]
pub struct LegendResolver {
    snapshot: Rc<MarketSnapshot>,
    visibility: VisibilityConfig,
}

impl LegendResolver {
    pub fn new(snapshot: Rc<MarketSnapshot>, visibility: VisibilityConfig) -> Self {
        Self { snapshot, visibility }
    }

    /// `price` is the close reported by the pane for the hovered bar, if any;
    /// otherwise the close is looked up in the snapshot.
    pub fn resolve(&self, time: Option<TimeKey>, price: Option<f64>) -> HoverReadout {
        let Some(time) = time else {
            return HoverReadout::default();
        };
        let indicators = &self.snapshot.indicators;
        let values = LEGEND_FIELDS
            .iter()
            .filter(|(id, _, _)| self.visibility.is_visible(*id))
            .map(|(id, field, label)| LegendValue { indicator: *id, label: *label, value: indicators.value_at(*field, time) })
            .collect();
        let pattern = self
            .snapshot
            .pattern_at(time)
            .map(|p| PatternReadout { label: p.label.clone(), confidence: p.confidence });

        HoverReadout {
            time: Some(time),
            price: price.or_else(|| self.snapshot.candle_at(time).map(|c| c.close)),
            values,
            pattern,
        }
    }
}
